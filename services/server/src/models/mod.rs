pub mod lottery_model;
pub mod option_model;
pub mod prize_model;
pub mod ticket_model;
pub mod user_model;
