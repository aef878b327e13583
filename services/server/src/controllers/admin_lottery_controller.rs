use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::ApiError;
use crate::services::{admin_service, lottery_service, ticket_service};
use crate::types::admin_types::{
    AdminLotteriesResponse, AdminLotteryHistoryResponse, AdminLotteryInfo, AdminLotteryResponse,
    CreateTicketsRequest, CreateTicketsResponse, LotteryUpsertRequest,
};
use crate::types::lottery_types::LotteryInfo;
use crate::utils::pagination::{Page, PageQuery};
use crate::utils::responses::Success;

#[get("/lotteries")]
pub async fn list_lotteries(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (lotteries, total) = lottery_service::list_lotteries(pool.get_ref(), page).await?;

    Ok(HttpResponse::Ok().json(Success::new(AdminLotteriesResponse {
        page: page.page,
        total_pages: page.total_pages(total),
        lotteries: lotteries.iter().map(AdminLotteryInfo::from).collect(),
    })))
}

#[get("/lotteries/history")]
pub async fn lottery_history(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (lotteries, total) =
        lottery_service::list_past_lotteries(pool.get_ref(), Utc::now(), page).await?;

    Ok(HttpResponse::Ok().json(Success::new(AdminLotteryHistoryResponse {
        page: page.page,
        total_pages: page.total_pages(total),
        lotteries: lotteries.iter().map(LotteryInfo::from).collect(),
    })))
}

#[get("/lotteries/{lottery_id}")]
pub async fn get_lottery(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let lottery = admin_service::get_lottery_details(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Success::new(AdminLotteryResponse { lottery })))
}

#[post("/lotteries")]
pub async fn create_lottery(
    pool: web::Data<PgPool>,
    body: web::Json<LotteryUpsertRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let created = admin_service::create_lottery(pool.get_ref(), &body).await?;
    let lottery = admin_service::get_lottery_details(pool.get_ref(), created.id).await?;

    Ok(HttpResponse::Created().json(Success::new(AdminLotteryResponse { lottery })))
}

#[put("/lotteries/{lottery_id}")]
pub async fn update_lottery(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<LotteryUpsertRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let updated = admin_service::update_lottery(pool.get_ref(), path.into_inner(), &body).await?;
    let lottery = admin_service::get_lottery_details(pool.get_ref(), updated.id).await?;

    Ok(HttpResponse::Ok().json(Success::new(AdminLotteryResponse { lottery })))
}

#[delete("/lotteries/{lottery_id}")]
pub async fn delete_lottery(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    admin_service::delete_lottery(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/lotteries/{lottery_id}/tickets")]
pub async fn create_tickets(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<CreateTicketsRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let lottery = lottery_service::get_lottery(pool.get_ref(), path.into_inner()).await?;
    let created = ticket_service::create_tickets(pool.get_ref(), lottery.id, &body.tickets).await?;

    Ok(HttpResponse::Created().json(Success::new(CreateTicketsResponse { created })))
}
