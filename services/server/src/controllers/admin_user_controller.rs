use actix_web::{delete, get, put, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::ApiError;
use crate::services::{ticket_service, user_service};
use crate::types::admin_types::{AdminUserInfoResponse, AdminUsersResponse};
use crate::types::user_types::{AdminUpdateUserRequest, UserOut};
use crate::utils::pagination::{Page, PageQuery, MAX_LIMIT};
use crate::utils::responses::Success;

#[get("/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::from(&*query);
    let (users, total) = user_service::list_users(pool.get_ref(), page, query.q.as_deref()).await?;

    Ok(HttpResponse::Ok().json(Success::new(AdminUsersResponse {
        page: page.page,
        total_pages: page.total_pages(total),
        users: users.into_iter().map(UserOut::from).collect(),
    })))
}

#[get("/users/{user_id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = user_service::get_user_out(pool.get_ref(), user_id).await?;

    let everything = Page::new(Some(1), Some(MAX_LIMIT));
    let (tickets, _) = ticket_service::get_user_tickets(pool.get_ref(), user_id, everything).await?;
    let (prizes, _) = user_service::get_user_prizes(pool.get_ref(), user_id, everything).await?;

    let nfts = ticket_service::group_by_lottery(tickets)
        .into_iter()
        .flat_map(|group| group.nfts)
        .collect();

    Ok(HttpResponse::Ok().json(Success::new(AdminUserInfoResponse { user, nfts, prizes })))
}

#[put("/users/{user_id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let user = user_service::admin_update_user(pool.get_ref(), path.into_inner(), &body).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
    })))
}

#[delete("/users/{user_id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    user_service::delete_user(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
