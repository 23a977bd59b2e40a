pub mod api;
pub mod booking;
pub mod config;
pub mod core_state;
pub mod db;
pub mod finance;
pub mod inventory;
pub mod models;
pub mod ranges;
pub mod registration;
pub mod results;
pub mod seed;
