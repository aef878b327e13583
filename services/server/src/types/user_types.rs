use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::user_model::{User, UserWithProfile};
use crate::types::lottery_types::LotteryShortInfo;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub id: i64,
    pub telegram_id: i64,
    pub telegram_username: Option<String>,
    pub telegram_name: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub inn: Option<i64>,
    pub ton_address: Option<String>,
}

impl From<UserWithProfile> for UserOut {
    fn from(u: UserWithProfile) -> Self {
        Self {
            id: u.id,
            telegram_id: u.telegram,
            telegram_username: u.username,
            telegram_name: u.first_name,
            full_name: u.full_name,
            phone_number: u.phone_number,
            inn: u.inn,
            ton_address: u.wallet_address,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShortUser {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
}

impl From<&User> for ShortUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            telegram_id: u.telegram,
            username: u.username.clone(),
            name: u.first_name.clone(),
        }
    }
}

/// `+` followed by 10 to 15 digits.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('+').unwrap_or("");
    if (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number"))
    }
}

/// Russian taxpayer numbers have 10 (organisations) or 12 (individuals) digits.
pub fn validate_inn(value: i64) -> Result<(), ValidationError> {
    let digits = if value > 0 { value.to_string().len() } else { 0 };
    if digits == 10 || digits == 12 {
        Ok(())
    } else {
        Err(ValidationError::new("inn"))
    }
}

fn validate_update_inn(req: &UpdateUserInfoRequest) -> Result<(), ValidationError> {
    req.inn.map_or(Ok(()), validate_inn)
}

fn validate_admin_update_inn(req: &AdminUpdateUserRequest) -> Result<(), ValidationError> {
    req.inn.map_or(Ok(()), validate_inn)
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_inn", skip_on_field_errors = false))]
pub struct UpdateUserInfoRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must not be empty"))]
    pub full_name: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,

    pub inn: Option<i64>,
}

impl UpdateUserInfoRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone_number.is_none() && self.inn.is_none()
    }
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_admin_update_inn", skip_on_field_errors = false))]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must not be empty"))]
    pub full_name: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,

    pub inn: Option<i64>,

    #[validate(length(min = 1, max = 255, message = "TON address must not be empty"))]
    pub ton_address: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BuyTicketResponse {
    pub payment_link: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserNftToken {
    pub id: i64,
    pub ticket_number: i32,
    pub name: String,
    pub image: String,
    pub address: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserLotteryTokens {
    pub lottery: LotteryShortInfo,
    pub nfts: Vec<UserNftToken>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserPrizeInfo {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub prize_type: String,
    pub description: String,
    pub image: String,
    pub lottery_id: i64,
    pub lottery_name: String,
    pub event_date: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_format() {
        assert!(validate_phone("+79001234567").is_ok());
        assert!(validate_phone("79001234567").is_err());
        assert!(validate_phone("not_a_number").is_err());
        assert!(validate_phone("+123").is_err());
    }

    #[test]
    fn inn_length() {
        assert!(validate_inn(1234567890).is_ok());
        assert!(validate_inn(123456789012).is_ok());
        assert!(validate_inn(123).is_err());
        assert!(validate_inn(-1234567890).is_err());
    }

    #[test]
    fn update_request_validation() {
        let ok: UpdateUserInfoRequest = serde_json::from_str(
            r#"{"fullName":"Giorno Giovanna","phoneNumber":"+79001234567","inn":123456789012}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
        assert!(!ok.is_empty());

        for bad in [r#"{"fullName":""}"#, r#"{"phoneNumber":"not_a_number"}"#, r#"{"inn":123}"#] {
            let req: UpdateUserInfoRequest = serde_json::from_str(bad).unwrap();
            assert!(req.validate().is_err(), "{} should fail", bad);
        }

        let empty: UpdateUserInfoRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
