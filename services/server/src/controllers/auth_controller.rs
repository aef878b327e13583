use actix_web::{post, web, HttpResponse};
use log::info;
use sqlx::PgPool;

use crate::config::Config;
use crate::errors::ApiError;
use crate::services::user_service::find_user;
use crate::types::auth_types::RefreshTokenRequest;
use crate::utils::jwt::{issue_token_pair, verify_token, TokenError, TokenType};

#[post("/auth/refresh")]
pub async fn refresh_token(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    body: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = verify_token(&body.refresh_token, TokenType::Refresh, &config.jwt)?;

    if find_user(pool.get_ref(), user_id).await?.is_none() {
        return Err(TokenError::Invalid.into());
    }

    let tokens = issue_token_pair(user_id, &config.jwt)?;
    info!("Refreshed tokens for user {}", user_id);
    Ok(HttpResponse::Ok().json(tokens))
}
