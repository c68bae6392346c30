//! Error types for the discovery pipeline.
//!
//! Every failure is terminal: stages return the first error they hit and the
//! binary is the only place that turns one into an exit status.

use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt;
use thiserror::Error;

/// Metadata key the AWS SDKs use for the request id.
const AWS_REQUEST_ID: &str = "aws_request_id";

/// A control-plane failure normalized to one shape, whatever the SDK returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: String,
    pub status: Option<u16>,
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Flatten an SDK error (ECS or EC2, both share the smithy error type).
    ///
    /// Service errors carry a code, a message and usually a request id.
    /// Transport failures (timeouts, DNS, credentials) carry none of those, so
    /// the whole source chain becomes the message.
    pub fn from_sdk<E>(err: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let code = err.code().map(str::to_string);
        let request_id = err.meta().extra(AWS_REQUEST_ID).map(str::to_string);
        let status = err.raw_response().map(|response| response.status().as_u16());
        let message = match err.message() {
            Some(message) => message.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };

        Self {
            code,
            message,
            status,
            request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message)?,
            None => write!(f, "{}", self.message)?,
        }

        match (self.status, &self.request_id) {
            (Some(status), Some(id)) => write!(f, " (HTTP {}, request id {})", status, id),
            (Some(status), None) => write!(f, " (HTTP {})", status),
            (None, Some(id)) => write!(f, " (request id {})", id),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for ApiError {}

/// The point in the pipeline that came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    TaskList,
    TaskDetails,
    RunningTasks,
    ContainerInstances,
    ActiveContainerInstances,
    Instances,
    RunningInstances,
}

impl Stage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::TaskList => "task list",
            Stage::TaskDetails => "task details",
            Stage::RunningTasks => "running tasks",
            Stage::ContainerInstances => "container instances",
            Stage::ActiveContainerInstances => "active container instances",
            Stage::Instances => "EC2 instances",
            Stage::RunningInstances => "running EC2 instances",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while bootstrapping from the local ECS agent.
#[derive(Debug, Error)]
pub enum AgentMetadataError {
    #[error("cannot reach ECS agent at {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("ECS agent at {url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot parse ECS agent metadata: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{context}: {source}")]
    Api {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Inconsistent response: {0}")]
    Inconsistent(String),

    #[error("{stage}: {detail}")]
    EmptyResult { stage: Stage, detail: String },

    #[error("Error retrieving metadata from the local ECS agent: {0}")]
    AgentMetadata(#[from] AgentMetadataError),

    #[error("Config error: {0}")]
    Config(String),
}

impl DiscoveryError {
    pub fn api(context: &'static str, source: ApiError) -> Self {
        DiscoveryError::Api { context, source }
    }

    pub fn empty(stage: Stage, detail: impl Into<String>) -> Self {
        DiscoveryError::EmptyResult {
            stage,
            detail: detail.into(),
        }
    }

    /// The stage that came up empty, if this is an empty-result failure.
    pub fn empty_stage(&self) -> Option<Stage> {
        match self {
            DiscoveryError::EmptyResult { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_full_metadata() {
        let err = ApiError::new("Cluster not found.")
            .with_code("ClusterNotFoundException")
            .with_status(400)
            .with_request_id("5f1a-22");
        assert_eq!(
            err.to_string(),
            "ClusterNotFoundException: Cluster not found. (HTTP 400, request id 5f1a-22)"
        );
    }

    #[test]
    fn test_api_error_without_metadata() {
        let err = ApiError::new("dispatch failure: connection refused");
        assert_eq!(err.to_string(), "dispatch failure: connection refused");

        let err = ApiError::new("throttled").with_request_id("abc");
        assert_eq!(err.to_string(), "throttled (request id abc)");
    }

    #[test]
    fn test_discovery_error_names_stage_and_context() {
        let err = DiscoveryError::empty(Stage::RunningTasks, "nothing left");
        assert_eq!(err.to_string(), "running tasks: nothing left");
        assert_eq!(err.empty_stage(), Some(Stage::RunningTasks));

        let err = DiscoveryError::api(
            "Cannot retrieve ECS task list",
            ApiError::new("denied").with_code("AccessDeniedException"),
        );
        assert_eq!(
            err.to_string(),
            "Cannot retrieve ECS task list: AccessDeniedException: denied"
        );
        assert_eq!(err.empty_stage(), None);
    }
}
