use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::lottery_model::{Lottery, LotteryWithTicketCount};
use crate::types::user_types::ShortUser;

pub fn price_to_f64(price: Decimal) -> f64 {
    price.to_f64().unwrap_or_default()
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotteryShortInfo {
    pub id: i64,
    pub name: String,
    pub event_date: i64,
}

impl From<&Lottery> for LotteryShortInfo {
    fn from(l: &Lottery) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            event_date: l.event_date.timestamp(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotteryInfo {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub banner: String,
    pub collection_banner: String,
    pub event_date: i64,
}

impl From<&Lottery> for LotteryInfo {
    fn from(l: &Lottery) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            short_description: l.short_description.clone(),
            banner: l.banner.clone(),
            collection_banner: l.collection_banner.clone(),
            event_date: l.event_date.timestamp(),
        }
    }
}

impl From<&LotteryWithTicketCount> for LotteryInfo {
    fn from(l: &LotteryWithTicketCount) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            short_description: l.short_description.clone(),
            banner: l.banner.clone(),
            collection_banner: l.collection_banner.clone(),
            event_date: l.event_date.timestamp(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrizeInfo {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub description: String,
    pub quantity: i32,
    pub winners: Vec<ShortUser>,
}

/// A lottery's prize pool split for display.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrizeBoard {
    pub grand_prizes: Vec<PrizeInfo>,
    pub prizes: Vec<PrizeInfo>,
    pub winners: Vec<ShortUser>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FullLotteryInfo {
    #[serde(flatten)]
    pub info: LotteryInfo,
    pub total_sum: i64,
    pub ticket_price: f64,
    pub available_nft_count: i64,
    pub total_nft_count: i64,
    #[serde(flatten)]
    pub board: PrizeBoard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_lotteries: Option<Vec<LotteryInfo>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LotteriesResponse {
    pub active_lottery: FullLotteryInfo,
    pub future_lotteries: Vec<LotteryInfo>,
}

#[derive(Serialize, Debug)]
pub struct LotteryResponse {
    pub lottery: FullLotteryInfo,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LotteryHistoryInfo {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub banner: String,
    pub collection_banner: String,
    pub event_date: i64,
    pub total_nft_count: i64,
    pub ticket_price: f64,
}

impl From<&LotteryWithTicketCount> for LotteryHistoryInfo {
    fn from(l: &LotteryWithTicketCount) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            short_description: l.short_description.clone(),
            banner: l.banner.clone(),
            collection_banner: l.collection_banner.clone(),
            event_date: l.event_date.timestamp(),
            total_nft_count: l.ticket_count,
            ticket_price: price_to_f64(l.ticket_price),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LotteryHistoryResponse {
    pub page: i64,
    pub total_pages: i64,
    pub lotteries: Vec<LotteryHistoryInfo>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NftQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub min_number: Option<i32>,
    pub max_number: Option<i32>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketNftToken {
    pub id: i64,
    pub ticket_number: i32,
    pub name: String,
    pub image: String,
    pub address: String,
    pub price: f64,
    pub buy_available: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NftTokensResponse {
    pub page: i64,
    pub total_pages: i64,
    pub nfts: Vec<MarketNftToken>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    Online,
    Offline,
}

impl LiveStatus {
    pub fn from_link(link: Option<&str>) -> Self {
        match link {
            Some(l) if !l.trim().is_empty() => LiveStatus::Online,
            _ => LiveStatus::Offline,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckLiveResponse {
    pub status: LiveStatus,
    pub live_link: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WinnerItem {
    pub prize_id: i64,
    pub title: String,
    pub user_id: i64,
}

#[derive(Serialize, Debug)]
pub struct WinnerUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub winners: Vec<WinnerItem>,
}

impl WinnerUpdate {
    pub fn new(winners: Vec<WinnerItem>) -> Self {
        Self {
            kind: "winner_update",
            winners,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct WsTokenQuery {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn live_status_from_link() {
        assert_eq!(LiveStatus::from_link(None), LiveStatus::Offline);
        assert_eq!(LiveStatus::from_link(Some("  ")), LiveStatus::Offline);
        assert_eq!(
            LiveStatus::from_link(Some("https://youtube.com/live/abc123")),
            LiveStatus::Online
        );
        assert_eq!(serde_json::to_value(LiveStatus::Online).unwrap(), json!("online"));
    }

    #[test]
    fn winner_update_shape() {
        let update = WinnerUpdate::new(vec![WinnerItem {
            prize_id: 3,
            title: "iPhone".into(),
            user_id: 9,
        }]);
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"type": "winner_update", "winners": [{"prize_id": 3, "title": "iPhone", "user_id": 9}]})
        );
    }

    #[test]
    fn full_info_is_flat_camel_case() {
        let info = FullLotteryInfo {
            info: LotteryInfo {
                id: 1,
                name: "Main".into(),
                short_description: "desc".into(),
                banner: "b".into(),
                collection_banner: "cb".into(),
                event_date: 1_700_000_000,
            },
            total_sum: 1000,
            ticket_price: 12.5,
            available_nft_count: 1,
            total_nft_count: 2,
            board: PrizeBoard::default(),
            other_lotteries: None,
        };
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(value["shortDescription"], "desc");
        assert_eq!(value["eventDate"], 1_700_000_000);
        assert_eq!(value["availableNftCount"], 1);
        assert_eq!(value["totalNftCount"], 2);
        assert_eq!(value["grandPrizes"], json!([]));
        assert!(value.get("otherLotteries").is_none());
    }
}
