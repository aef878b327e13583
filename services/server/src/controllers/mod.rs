pub mod admin_controller;
pub mod admin_lottery_controller;
pub mod admin_user_controller;
pub mod auth_controller;
pub mod lottery_controller;
pub mod user_controller;
