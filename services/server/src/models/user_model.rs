use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub telegram: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// A user joined with its (optional) profile.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct UserWithProfile {
    pub id: i64,
    pub telegram: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub phone_number: Option<String>,
    pub full_name: Option<String>,
    pub inn: Option<i64>,
    pub wallet_address: Option<String>,
}
