pub mod commission;
pub mod doctor;
pub mod enums;
pub mod inventory;
pub mod order;
pub mod patient;
pub mod test_definition;

pub use commission::CommissionEntry;
pub use enums::{CommissionStatus, OrderStatus, RuleGender};
pub use doctor::Doctor;
pub use inventory::InventoryItem;
pub use order::{LabOrder, LabResult};
pub use patient::Patient;
pub use test_definition::{ReferenceRange, TestConsumption, TestDefinition};
