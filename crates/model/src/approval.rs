use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the object wrapping the approval details in a pipeline notification.
const APPROVAL: &str = "approval";

/// Accepted keys for each field, pipeline notification name first.
const TOKEN: (&str, &[&str]) = ("token", &["token"]);
const PIPELINE: (&str, &[&str]) = ("pipeline", &["pipelineName", "pipeline"]);
const STAGE: (&str, &[&str]) = ("stage", &["stageName", "stage"]);
const APPROVAL_ACTION: (&str, &[&str]) = ("approval_action", &["actionName", "approval_action"]);
const CUSTOM_DATA: (&str, &[&str]) = ("custom_data", &["customData", "custom_data"]);

/// A validated pending-approval notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalMessage {
    pub token: String,
    pub pipeline: String,
    pub stage: String,
    pub approval_action: String,
    pub custom_data: String,
    image_digest: String,
}

impl ApprovalMessage {
    /// Parse the body of a single notification record.
    ///
    /// The body must be JSON with an `approval` object holding the token, pipeline,
    /// stage, action and custom data as strings. The image digest is everything in
    /// `custom_data` after the first `=`.
    pub fn parse(raw_message: &str) -> Result<ApprovalMessage, ParseError> {
        let body: Value = serde_json::from_str(raw_message)
            .map_err(|err| ParseError::MalformedJson(err.to_string()))?;

        let approval: &Map<String, Value> = body
            .get(APPROVAL)
            .and_then(Value::as_object)
            .ok_or(ParseError::MissingField(APPROVAL))?;

        let token: String = required_str(approval, TOKEN)?;
        if token.is_empty() {
            return Err(ParseError::MissingField(TOKEN.0));
        }
        let pipeline: String = required_str(approval, PIPELINE)?;
        let stage: String = required_str(approval, STAGE)?;
        let approval_action: String = required_str(approval, APPROVAL_ACTION)?;
        let custom_data: String = required_str(approval, CUSTOM_DATA)?;

        let image_digest: String = match custom_data.split_once('=') {
            Some((_, digest)) => digest.to_string(),
            None => return Err(ParseError::InvalidCustomData(custom_data)),
        };

        Ok(ApprovalMessage {
            token,
            pipeline,
            stage,
            approval_action,
            custom_data,
            image_digest,
        })
    }

    pub fn image_digest(&self) -> &str {
        &self.image_digest
    }
}

fn required_str(
    approval: &Map<String, Value>,
    (name, keys): (&'static str, &[&str]),
) -> Result<String, ParseError> {
    keys.iter()
        .find_map(|key| approval.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ParseError::MissingField(name))
}

/// Errors arising from parsing a notification body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("message body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("required field `{0}` is missing or not a string")]
    MissingField(&'static str),
    #[error("custom data `{0}` has no `=` separating the image digest")]
    InvalidCustomData(String),
}

impl ParseError {
    /// Short name of the failure, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedJson(_) => "MalformedJSON",
            ParseError::MissingField(_) => "MissingField",
            ParseError::InvalidCustomData(_) => "InvalidCustomData",
        }
    }
}

/// The item persisted for each approval, keyed by `ImageDigest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApprovalRecord {
    pub image_digest: String,
    pub approval_token: String,
    pub pipeline_name: String,
    pub stage: String,
    pub action_name: String,
    /// ISO-8601 UTC timestamp of the write.
    pub insert_date: String,
}

/// Name of the table's partition key attribute.
pub const IMAGE_DIGEST: &str = "ImageDigest";

impl ApprovalRecord {
    pub fn new(message: ApprovalMessage, insert_date: String) -> Self {
        ApprovalRecord {
            image_digest: message.image_digest,
            approval_token: message.token,
            pipeline_name: message.pipeline,
            stage: message.stage,
            action_name: message.approval_action,
            insert_date,
        }
    }
}
