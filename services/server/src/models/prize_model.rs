use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const GRAND_PRIZE_TYPE: &str = "grand";
pub const ORDINARY_PRIZE_TYPE: &str = "ordinary";

#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct Prize {
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub prize_type: String,
    pub description: String,
    pub quantity: i32,
    pub winners: Option<i64>,
    pub image: String,
}

impl Prize {
    pub fn is_grand(&self) -> bool {
        self.prize_type == GRAND_PRIZE_TYPE
    }
}

/// A (prize, winner) pair for one lottery.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct PrizeWinner {
    pub prize_id: i64,
    pub title: String,
    pub user_id: i64,
    pub telegram: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// A prize awarded to a user, with the lottery it was drawn in.
#[derive(FromRow, Debug, Clone)]
pub struct AwardedPrize {
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "type")]
    pub prize_type: String,
    pub description: String,
    pub image: String,
    pub lottery_id: i64,
    pub lottery_name: String,
    pub event_date: DateTime<Utc>,
}
