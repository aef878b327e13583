pub mod admin_types;
pub mod auth_types;
pub mod lottery_types;
pub mod user_types;
