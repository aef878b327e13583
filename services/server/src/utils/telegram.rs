//! Telegram Mini App init data: parsing and signature checks.
//!
//! The client passes the raw `initData` query string. Its `hash` field is an
//! HMAC-SHA256 over the remaining `key=value` pairs, sorted by key and joined
//! with `\n`, keyed by `HMAC-SHA256("WebAppData", bot_token)`.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitDataError {
    #[error("Invalid init data")]
    Malformed,

    #[error("Invalid init data signature")]
    BadSignature,

    #[error("Init data expired")]
    Expired,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WebAppUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebAppInitData {
    pub query_id: Option<String>,
    pub user: WebAppUser,
    pub auth_date: i64,
    pub hash: String,
}

fn parse_pairs(init_data: &str) -> Result<BTreeMap<String, String>, InitDataError> {
    if init_data.trim().is_empty() {
        return Err(InitDataError::Malformed);
    }

    let mut pairs = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(init_data.as_bytes()) {
        if pairs.insert(key.into_owned(), value.into_owned()).is_some() {
            return Err(InitDataError::Malformed);
        }
    }
    Ok(pairs)
}

pub fn parse_init_data(init_data: &str) -> Result<WebAppInitData, InitDataError> {
    let mut pairs = parse_pairs(init_data)?;

    let hash = pairs.remove("hash").ok_or(InitDataError::Malformed)?;
    let auth_date = pairs
        .get("auth_date")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(InitDataError::Malformed)?;
    let user = pairs
        .get("user")
        .ok_or(InitDataError::Malformed)
        .and_then(|raw| serde_json::from_str::<WebAppUser>(raw).map_err(|_| InitDataError::Malformed))?;

    Ok(WebAppInitData {
        query_id: pairs.remove("query_id"),
        user,
        auth_date,
        hash,
    })
}

fn data_check_string(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn signing_mac(bot_token: &str) -> Result<HmacSha256, InitDataError> {
    let mut secret =
        HmacSha256::new_from_slice(WEB_APP_DATA_KEY).map_err(|_| InitDataError::BadSignature)?;
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();
    HmacSha256::new_from_slice(&secret_key).map_err(|_| InitDataError::BadSignature)
}

pub fn check_signature(bot_token: &str, init_data: &str) -> Result<(), InitDataError> {
    let pairs = parse_pairs(init_data)?;
    let hash = pairs.get("hash").ok_or(InitDataError::Malformed)?;
    let expected = hex::decode(hash).map_err(|_| InitDataError::BadSignature)?;

    let mut mac = signing_mac(bot_token)?;
    mac.update(data_check_string(&pairs).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| InitDataError::BadSignature)
}

pub fn check_freshness(auth_date: i64, now: i64, max_age_secs: i64) -> Result<(), InitDataError> {
    if max_age_secs > 0 && now - auth_date > max_age_secs {
        return Err(InitDataError::Expired);
    }
    Ok(())
}

/// Signs `pairs` the way the Telegram client does and returns the encoded
/// init data string, `hash` included.
#[cfg(test)]
pub(crate) fn sign_init_data(bot_token: &str, pairs: &[(&str, &str)]) -> String {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut mac = signing_mac(bot_token).unwrap();
    mac.update(data_check_string(&map).as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456:TEST-BOT-TOKEN";
    const USER: &str = r#"{"id":123456789,"first_name":"Test","last_name":"User","username":"testuser","photo_url":"https://t.me/photo.jpg"}"#;

    fn signed() -> String {
        sign_init_data(
            TOKEN,
            &[("query_id", "AAAA1"), ("user", USER), ("auth_date", "1700000000")],
        )
    }

    #[test]
    fn valid_signature_passes() {
        assert_eq!(check_signature(TOKEN, &signed()), Ok(()));
    }

    #[test]
    fn other_bot_token_fails() {
        assert_eq!(
            check_signature("999:OTHER", &signed()),
            Err(InitDataError::BadSignature)
        );
    }

    #[test]
    fn tampered_payload_fails() {
        let tampered = signed().replace("auth_date=1700000000", "auth_date=1700000001");
        assert_eq!(
            check_signature(TOKEN, &tampered),
            Err(InitDataError::BadSignature)
        );
    }

    #[test]
    fn non_hex_hash_fails() {
        let data = "query_id=AAAA1&auth_date=1&hash=securehash";
        assert_eq!(check_signature(TOKEN, data), Err(InitDataError::BadSignature));
    }

    #[test]
    fn parses_user_fields() {
        let parsed = parse_init_data(&signed()).unwrap();
        assert_eq!(parsed.query_id.as_deref(), Some("AAAA1"));
        assert_eq!(parsed.auth_date, 1_700_000_000);
        assert_eq!(parsed.user.id, 123456789);
        assert_eq!(parsed.user.username.as_deref(), Some("testuser"));
        assert_eq!(parsed.user.photo_url.as_deref(), Some("https://t.me/photo.jpg"));
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert_eq!(parse_init_data("").unwrap_err(), InitDataError::Malformed);
        assert_eq!(
            parse_init_data("auth_date=1&hash=ab").unwrap_err(),
            InitDataError::Malformed
        );
        assert_eq!(
            parse_init_data("user=%7Bbroken&auth_date=1&hash=ab").unwrap_err(),
            InitDataError::Malformed
        );
    }

    #[test]
    fn freshness_window() {
        assert_eq!(check_freshness(100, 200, 0), Ok(()));
        assert_eq!(check_freshness(100, 200, 100), Ok(()));
        assert_eq!(check_freshness(100, 201, 100), Err(InitDataError::Expired));
    }
}
