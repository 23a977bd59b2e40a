pub mod doctors;
pub mod finance;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod patients;
pub mod results;
pub mod tests;
