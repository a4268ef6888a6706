pub mod approval;
pub mod env;
pub mod envelope;

pub use approval::{ApprovalMessage, ApprovalRecord, ParseError};
pub use envelope::{NotificationEnvelope, NotificationMessage, NotificationRecord};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
