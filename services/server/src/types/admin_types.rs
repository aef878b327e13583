use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::lottery_model::LotteryWithTicketCount;
use crate::types::lottery_types::{price_to_f64, LiveStatus, LotteryInfo, LotteryShortInfo, PrizeBoard};
use crate::types::user_types::{UserNftToken, UserOut, UserPrizeInfo};

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub users_count: i64,
    pub tickets_count: i64,
    pub tickets_sold_count: i64,
    pub tickets_earn: f64,
    pub active_lottery_participants: i64,
    pub active_lottery_sold_tickets_count: i64,
    pub active_lottery_tickets_count: i64,
    pub active_lottery_tickets_earn: f64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatResponse {
    pub active_lottery: Option<LotteryShortInfo>,
    pub live_status: LiveStatus,
    pub stat: Stat,
}

#[derive(Serialize, Debug)]
pub struct ShortLotteriesResponse {
    pub lotteries: Vec<LotteryShortInfo>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveLotteryResponse {
    pub active_lottery: LotteryShortInfo,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLiveStatusRequest {
    #[serde(default)]
    pub live_link: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLiveStatusResponse {
    pub live_status: LiveStatus,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminLotteryInfo {
    pub id: i64,
    pub name: String,
    pub event_date: i64,
    pub is_active: bool,
    pub total_nft_count: i64,
    pub nft_cost: f64,
}

impl From<&LotteryWithTicketCount> for AdminLotteryInfo {
    fn from(l: &LotteryWithTicketCount) -> Self {
        Self {
            id: l.id,
            name: l.name.clone(),
            event_date: l.event_date.timestamp(),
            is_active: l.is_active,
            total_nft_count: l.ticket_count,
            nft_cost: price_to_f64(l.ticket_price),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminLotteriesResponse {
    pub page: i64,
    pub total_pages: i64,
    pub lotteries: Vec<AdminLotteryInfo>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminLotteryHistoryResponse {
    pub page: i64,
    pub total_pages: i64,
    pub lotteries: Vec<LotteryInfo>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminLotteryDetails {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub banner: String,
    pub collection_banner: String,
    pub event_date: i64,
    pub is_active: bool,
    pub total_sum: i64,
    pub ticket_price: f64,
    pub collection_name: String,
    pub collection_address: String,
    pub collection_chain: String,
    pub ticket_template: Option<String>,
    pub tickets_count: i64,
    pub sold_tickets_count: i64,
    pub available_nft_count: i64,
    pub total_nft_count: i64,
    #[serde(flatten)]
    pub board: PrizeBoard,
}

#[derive(Serialize, Debug)]
pub struct AdminLotteryResponse {
    pub lottery: AdminLotteryDetails,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrizeInput {
    #[validate(length(min = 1, max = 255, message = "Prize title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "Prize quantity must be positive"))]
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 && price < 100_000_000.0 {
        Ok(())
    } else {
        Err(ValidationError::new("ticket_price"))
    }
}

fn validate_each<T: Validate>(items: &[T], code: &'static str) -> Result<(), ValidationError> {
    if items.iter().all(|item| item.validate().is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new(code))
    }
}

fn validate_lottery(req: &LotteryUpsertRequest) -> Result<(), ValidationError> {
    validate_price(req.ticket_price)?;
    for list in [&req.grand_prizes, &req.prizes].into_iter().flatten() {
        validate_each(list, "prizes")?;
    }
    Ok(())
}

fn validate_tickets(req: &CreateTicketsRequest) -> Result<(), ValidationError> {
    validate_each(&req.tickets, "tickets")
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_lottery", skip_on_field_errors = false))]
pub struct LotteryUpsertRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub short_description: String,
    #[validate(length(max = 255))]
    pub banner: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub collection_banner: String,
    pub event_date: i64,
    #[validate(range(min = 0, message = "Total sum must not be negative"))]
    pub total_sum: i64,
    pub ticket_price: f64,
    #[validate(length(max = 255))]
    pub collection_name: String,
    #[validate(length(max = 255))]
    pub collection_address: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub collection_chain: String,
    pub ticket_template: Option<String>,
    pub grand_prizes: Option<Vec<PrizeInput>>,
    pub prizes: Option<Vec<PrizeInput>>,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketInput {
    #[validate(range(min = 1, message = "Ticket number must be positive"))]
    pub number: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub image: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[validate(schema(function = "validate_tickets", skip_on_field_errors = false))]
pub struct CreateTicketsRequest {
    #[validate(length(min = 1, message = "At least one ticket must be provided"))]
    pub tickets: Vec<TicketInput>,
}

#[derive(Serialize, Debug)]
pub struct CreateTicketsResponse {
    pub created: usize,
}

#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersResponse {
    pub page: i64,
    pub total_pages: i64,
    pub users: Vec<UserOut>,
}

#[derive(Serialize, Debug)]
pub struct AdminUserInfoResponse {
    pub user: UserOut,
    pub nfts: Vec<UserNftToken>,
    pub prizes: Vec<UserPrizeInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::responses::Success;

    fn lottery_json(extra: &str) -> String {
        format!(
            r#"{{"name":"Updated Lottery","shortDescription":"Updated Description","banner":"new_banner",
            "collectionBanner":"new_cb","eventDate":1700000000,"totalSum":500,"ticketPrice":20.0,
            "collectionName":"New Col","collectionAddress":"New Addr","mainBanner":"","headerBanner":""{}}}"#,
            extra
        )
    }

    #[test]
    fn upsert_request_accepts_client_payload() {
        let req: LotteryUpsertRequest =
            serde_json::from_str(&lottery_json(r#","grandPrizes":[],"prizes":[]"#)).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.grand_prizes.as_deref().map(<[PrizeInput]>::len), Some(0));
        assert_eq!(req.ticket_price, 20.0);
    }

    #[test]
    fn upsert_request_rejects_bad_prize_and_price() {
        let req: LotteryUpsertRequest = serde_json::from_str(&lottery_json(
            r#","prizes":[{"title":"","quantity":0}]"#,
        ))
        .unwrap();
        assert!(req.validate().is_err());

        let negative: LotteryUpsertRequest =
            serde_json::from_str(&lottery_json("").replace("20.0", "-1.0")).unwrap();
        assert!(negative.validate().is_err());
    }

    #[test]
    fn ticket_batch_must_not_be_empty() {
        let req: CreateTicketsRequest = serde_json::from_str(r#"{"tickets":[]}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateTicketsRequest = serde_json::from_str(
            r#"{"tickets":[{"number":1,"name":"NFT #1","image":"https://img","address":"TON1"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let req: CreateTicketsRequest = serde_json::from_str(
            r#"{"tickets":[{"number":0,"name":"NFT #0","image":"","address":"TON0"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn admin_responses_carry_success_flag() {
        let stat = serde_json::to_value(Success::new(StatResponse {
            active_lottery: None,
            live_status: LiveStatus::Offline,
            stat: Stat::default(),
        }))
        .unwrap();
        assert_eq!(stat["success"], true);
        assert_eq!(stat["liveStatus"], "offline");
        assert_eq!(stat["stat"]["usersCount"], 0);

        let page = serde_json::to_value(Success::new(AdminLotteriesResponse {
            page: 2,
            total_pages: 3,
            lotteries: Vec::new(),
        }))
        .unwrap();
        assert_eq!(page["success"], true);
        assert_eq!(page["page"], 2);
        assert_eq!(page["totalPages"], 3);
        assert_eq!(page["lotteries"], serde_json::json!([]));
    }
}
