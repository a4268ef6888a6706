use aws_lambda_events::sns::{SnsEvent, SnsRecord};
use serde::{Deserialize, Serialize};

/// A delivery from the notification topic, holding one or more records in bus order.
///
/// Accepts both the lowercase shape and the SNS Lambda event shape
/// (`Records` / `Sns` / `Message`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(alias = "Records")]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(alias = "Sns")]
    pub sns: NotificationMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// JSON-encoded approval message.
    #[serde(alias = "Message")]
    pub message: String,
}

impl NotificationRecord {
    pub fn new(message: impl Into<String>) -> Self {
        NotificationRecord {
            sns: NotificationMessage {
                message: message.into(),
            },
        }
    }

    pub fn message(&self) -> &str {
        &self.sns.message
    }
}

impl From<SnsEvent> for NotificationEnvelope {
    fn from(event: SnsEvent) -> Self {
        NotificationEnvelope {
            records: event
                .records
                .into_iter()
                .map(|record: SnsRecord| NotificationRecord::new(record.sns.message))
                .collect(),
        }
    }
}
