use serde::{Deserialize, Serialize};

use crate::types::user_types::UserOut;

#[derive(Deserialize, Debug)]
pub struct InitDataForm {
    pub init_data: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken", alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserOut,
}
