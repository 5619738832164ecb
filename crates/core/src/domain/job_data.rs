// Job Data - serialized job payload handed to the executor

use crate::domain::error::JobError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Queue used when a payload does not name one
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Serialized job payload (JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    pub job_class: String,
    pub job_id: String,

    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    /// JSON array of serialized arguments
    #[serde(default = "empty_arguments")]
    pub arguments: Value,

    /// Absent for payloads written before executions were counted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executions: Option<u32>,
}

fn default_queue_name() -> String {
    DEFAULT_QUEUE_NAME.to_string()
}

fn empty_arguments() -> Value {
    Value::Array(Vec::new())
}

impl JobData {
    pub fn new(job_class: impl Into<String>, job_id: impl Into<String>, arguments: Value) -> Self {
        Self {
            job_class: job_class.into(),
            job_id: job_id.into(),
            queue_name: default_queue_name(),
            priority: None,
            arguments,
            executions: None,
        }
    }

    pub fn from_json(s: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string(self)?)
    }
}
