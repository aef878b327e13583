pub mod jwt;
pub mod pagination;
pub mod responses;
pub mod telegram;
