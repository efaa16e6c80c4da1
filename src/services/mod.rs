pub mod batch_source;
pub mod file_resolver;
pub mod outcome_log;
pub mod patient_parser;

pub use batch_source::{BatchSource, CsvBatchSource};
pub use file_resolver::{FileResolver, SearchRoots};
pub use outcome_log::{OutcomeLog, OutcomeRow};
pub use patient_parser::{is_date_token, parse_patient_descriptor};
