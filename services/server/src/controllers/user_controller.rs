use actix_web::{get, post, put, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::{ticket_service, user_service};
use crate::types::auth_types::InitDataForm;
use crate::types::user_types::{BuyTicketResponse, UpdateUserInfoRequest};
use crate::utils::pagination::{Page, PageQuery};

#[post("/users/loginByInitData")]
pub async fn login_by_init_data(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<InitDataForm>,
) -> Result<HttpResponse, ApiError> {
    let login = user_service::login_by_init_data(pool.get_ref(), &config, &form.init_data).await?;
    Ok(HttpResponse::Ok().json(login))
}

#[post("/buy/{ticket_id}")]
pub async fn buy_ticket(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let payment_link = ticket_service::reserve_ticket(pool.get_ref(), path.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(BuyTicketResponse { payment_link }))
}

#[put("/updateData")]
pub async fn update_user_data(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<UpdateUserInfoRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let updated = user_service::update_profile(pool.get_ref(), user.id, &body).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": updated,
    })))
}

#[get("/me")]
pub async fn get_me(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let me = user_service::get_user_out(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": me })))
}

#[get("/nfts")]
pub async fn get_my_nfts(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (tickets, total) = ticket_service::get_user_tickets(pool.get_ref(), user.id, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "page": page.page,
        "totalPages": page.total_pages(total),
        "tokens": ticket_service::group_by_lottery(tickets),
    })))
}

#[get("/prizes")]
pub async fn get_my_prizes(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (prizes, total) = user_service::get_user_prizes(pool.get_ref(), user.id, page).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "page": page.page,
        "totalPages": page.total_pages(total),
        "prizes": prizes,
    })))
}
