pub mod commission;
pub mod doctor;
pub mod inventory;
pub mod order;
pub mod patient;
pub mod test_definition;
