use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct Ticket {
    pub id: i64,
    pub lottery_id: i64,
    pub owner_id: Option<i64>,
    pub number: i32,
    pub name: String,
    pub image: String,
    pub address: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// One ticket with the price of the lottery it belongs to.
#[derive(FromRow, Debug, Clone)]
pub struct TicketSale {
    pub lottery_id: i64,
    pub owner_id: Option<i64>,
    pub ticket_price: Decimal,
}

/// A ticket owned by a user, carrying its lottery's short info.
#[derive(FromRow, Debug, Clone)]
pub struct OwnedTicket {
    pub id: i64,
    pub number: i32,
    pub name: String,
    pub image: String,
    pub address: String,
    pub lottery_id: i64,
    pub lottery_name: String,
    pub lottery_event_date: DateTime<Utc>,
}
