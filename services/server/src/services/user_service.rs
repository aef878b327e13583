use chrono::Utc;
use log::{info, warn};
use sqlx::PgPool;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::prize_model::AwardedPrize;
use crate::models::user_model::{User, UserWithProfile};
use crate::types::auth_types::LoginResponse;
use crate::types::user_types::{
    AdminUpdateUserRequest, UpdateUserInfoRequest, UserOut, UserPrizeInfo,
};
use crate::utils::jwt::issue_token_pair;
use crate::utils::pagination::Page;
use crate::utils::telegram::{
    check_freshness, check_signature, parse_init_data, InitDataError, WebAppUser,
};

const USER_WITH_PROFILE_SELECT: &str = "SELECT u.id, u.telegram, u.first_name, u.last_name, \
    u.username, u.photo, u.registered_at, p.phone_number, p.full_name, p.inn, p.wallet_address \
    FROM users u LEFT JOIN user_profiles p ON p.user_id = u.id";

pub async fn find_user(pool: &PgPool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, telegram, first_name, last_name, username, photo, registered_at \
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_with_profile(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<UserWithProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserWithProfile>(&format!("{} WHERE u.id = $1", USER_WITH_PROFILE_SELECT))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_out(pool: &PgPool, user_id: i64) -> Result<UserOut, ApiError> {
    find_user_with_profile(pool, user_id)
        .await?
        .map(UserOut::from)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn ensure_profile(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Finds the user by Telegram id, creating it and an empty profile on first login.
pub async fn upsert_telegram_user(pool: &PgPool, tg_user: &WebAppUser) -> Result<i64, sqlx::Error> {
    let created: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO users (telegram, first_name, last_name, username, photo)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (telegram) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(tg_user.id)
    .bind(&tg_user.first_name)
    .bind(&tg_user.last_name)
    .bind(&tg_user.username)
    .bind(&tg_user.photo_url)
    .fetch_optional(pool)
    .await?;

    let user_id = match created {
        Some(id) => {
            info!("Registered telegram user {} as {}", tg_user.id, id);
            id
        }
        None => {
            sqlx::query_scalar("SELECT id FROM users WHERE telegram = $1")
                .bind(tg_user.id)
                .fetch_one(pool)
                .await?
        }
    };

    ensure_profile(pool, user_id).await?;
    Ok(user_id)
}

pub async fn login_by_init_data(
    pool: &PgPool,
    config: &Config,
    init_data: &str,
) -> Result<LoginResponse, ApiError> {
    let parsed = parse_init_data(init_data).map_err(|e| ApiError::bad_request(e.to_string()))?;

    check_signature(&config.bot_token, init_data).map_err(|e| match e {
        InitDataError::Malformed => ApiError::bad_request(e.to_string()),
        _ => ApiError::unauthorized(e.to_string()),
    })?;
    check_freshness(parsed.auth_date, Utc::now().timestamp(), config.init_data_max_age_secs)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user_id = upsert_telegram_user(pool, &parsed.user).await?;
    let user = get_user_out(pool, user_id).await?;
    let tokens = issue_token_pair(user_id, &config.jwt)?;

    Ok(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user,
    })
}

/// Updates the caller's own profile; absent fields keep their value.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    req: &UpdateUserInfoRequest,
) -> Result<UserOut, ApiError> {
    if req.is_empty() {
        return Err(ApiError::bad_request("At least one field must be provided"));
    }

    let updated = sqlx::query(
        r#"
        UPDATE user_profiles
        SET full_name = COALESCE($1, full_name),
            phone_number = COALESCE($2, phone_number),
            inn = COALESCE($3, inn)
        WHERE user_id = $4
        "#,
    )
    .bind(&req.full_name)
    .bind(&req.phone_number)
    .bind(req.inn)
    .bind(user_id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        warn!("User {} has no profile to update", user_id);
        return Err(ApiError::bad_request("User profile not found"));
    }

    get_user_out(pool, user_id).await
}

pub async fn admin_update_user(
    pool: &PgPool,
    user_id: i64,
    req: &AdminUpdateUserRequest,
) -> Result<UserOut, ApiError> {
    if find_user(pool, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    ensure_profile(pool, user_id).await?;

    sqlx::query(
        r#"
        UPDATE user_profiles
        SET full_name = COALESCE($1, full_name),
            phone_number = COALESCE($2, phone_number),
            inn = COALESCE($3, inn),
            wallet_address = COALESCE($4, wallet_address)
        WHERE user_id = $5
        "#,
    )
    .bind(&req.full_name)
    .bind(&req.phone_number)
    .bind(req.inn)
    .bind(&req.ton_address)
    .bind(user_id)
    .execute(pool)
    .await?;

    info!("User {} updated by admin", user_id);
    get_user_out(pool, user_id).await
}

/// Users ordered by registration, newest first. `q` matches names,
/// username or the Telegram id.
pub async fn list_users(
    pool: &PgPool,
    page: Page,
    q: Option<&str>,
) -> Result<(Vec<UserWithProfile>, i64), sqlx::Error> {
    let pattern = q
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));

    let filter = "($1::TEXT IS NULL OR u.username ILIKE $1 OR u.first_name ILIKE $1 \
                  OR u.last_name ILIKE $1 OR p.full_name ILIKE $1 OR u.telegram::TEXT ILIKE $1)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM users u LEFT JOIN user_profiles p ON p.user_id = u.id WHERE {}",
        filter
    ))
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let users = sqlx::query_as::<_, UserWithProfile>(&format!(
        "{} WHERE {} ORDER BY u.registered_at DESC, u.id DESC LIMIT $2 OFFSET $3",
        USER_WITH_PROFILE_SELECT, filter
    ))
    .bind(&pattern)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((users, total))
}

pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<(), ApiError> {
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    info!("User {} deleted", user_id);
    Ok(())
}

impl From<AwardedPrize> for UserPrizeInfo {
    fn from(p: AwardedPrize) -> Self {
        Self {
            id: p.id,
            title: p.title,
            prize_type: p.prize_type,
            description: p.description,
            image: p.image,
            lottery_id: p.lottery_id,
            lottery_name: p.lottery_name,
            event_date: p.event_date.timestamp(),
        }
    }
}

/// Prizes awarded to `user_id`, most recent draw first.
pub async fn get_user_prizes(
    pool: &PgPool,
    user_id: i64,
    page: Page,
) -> Result<(Vec<UserPrizeInfo>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM user_prizes up
        JOIN prizes p ON p.id = up.prize_id
        JOIN lottery_prizes lp ON lp.prize_id = p.id
        JOIN lotteries l ON l.id = lp.lottery_id
        WHERE up.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let prizes = sqlx::query_as::<_, AwardedPrize>(
        r#"
        SELECT p.id, p.title, p.type, p.description, p.image,
               l.id AS lottery_id, l.name AS lottery_name, l.event_date
        FROM user_prizes up
        JOIN prizes p ON p.id = up.prize_id
        JOIN lottery_prizes lp ON lp.prize_id = p.id
        JOIN lotteries l ON l.id = lp.lottery_id
        WHERE up.user_id = $1
        ORDER BY l.event_date DESC, up.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((prizes.into_iter().map(UserPrizeInfo::from).collect(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn awarded_prize_carries_lottery_and_unix_date() {
        let info = UserPrizeInfo::from(AwardedPrize {
            id: 3,
            title: "Grand".into(),
            prize_type: "grand".into(),
            description: "desc".into(),
            image: "img".into(),
            lottery_id: 9,
            lottery_name: "Summer".into(),
            event_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        });

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "grand");
        assert_eq!(json["lotteryId"], 9);
        assert_eq!(json["lotteryName"], "Summer");
        assert_eq!(json["eventDate"], 1_700_000_000);
    }
}
