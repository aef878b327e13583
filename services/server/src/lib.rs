pub mod config;
pub mod controllers;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod types;
pub mod utils;
