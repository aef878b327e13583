use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct Lottery {
    pub id: i64,
    pub name: String,
    pub banner: String,
    pub collection_banner: String,
    pub short_description: String,
    pub total_sum: i64,
    pub event_date: DateTime<Utc>,
    pub is_active: bool,
    pub collection_name: String,
    pub collection_address: String,
    pub collection_chain: String,
    pub ticket_template: Option<String>,
    pub ticket_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Lottery row plus its ticket count, used by the listing endpoints.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct LotteryWithTicketCount {
    pub id: i64,
    pub name: String,
    pub banner: String,
    pub collection_banner: String,
    pub short_description: String,
    pub event_date: DateTime<Utc>,
    pub is_active: bool,
    pub ticket_price: Decimal,
    pub ticket_count: i64,
}
