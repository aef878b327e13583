pub mod admin_service;
pub mod file_upload;
pub mod live_status;
pub mod lottery_service;
pub mod ticket_service;
pub mod user_service;
