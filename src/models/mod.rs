pub mod outcome;
pub mod patient;

pub use outcome::{BatchOutcome, Disposition, ExecutionMode};
pub use patient::{PatientIdentity, PatientRecord};
