pub mod complaint;
pub mod severity;
pub mod stats;
pub mod error;

pub use complaint::{validate_id, Complaint, ComplaintPatch, NewComplaint, Resolution};
pub use complaint::{MAX_LABEL_LEN, MAX_TEXT_LEN};
pub use complaint::{DEFAULT_AGENT_NAME, DEFAULT_PROJECT_NAME, DEFAULT_SESSION_ID};
pub use severity::Severity;
pub use stats::CacheStats;
pub use error::ValidationError;
