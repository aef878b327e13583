use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const LIVE_LINK_KEY: &str = "live_link";

#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct AppOption {
    pub id: i32,
    pub title: String,
    pub key: String,
    pub value: String,
}
