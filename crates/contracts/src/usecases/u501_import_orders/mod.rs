pub mod response;

pub use response::{ImportFailure, ImportFailureKind, ImportRunSummary, ImportStatus};
