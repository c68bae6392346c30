//! Identification of the local host through the ECS agent
//!
//! The ECS agent on the Docker host exposes an introspection endpoint that
//! tells us which cluster we belong to and which container instance we are.
//! Only used when discovering peers in our own cluster.

use crate::error::AgentMetadataError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Introspection endpoint as seen from a container on the default bridge.
pub const DEFAULT_METADATA_URL: &str = "http://172.17.42.1:51678/v1/metadata";

/// Metadata document returned by the ECS agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "ContainerInstanceArn")]
    pub container_instance_arn: String,
    #[serde(rename = "Version", default)]
    pub version: String,
}

#[derive(Clone, Debug)]
pub struct AgentMetadataClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl AgentMetadataClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Fetch and decode the agent metadata
    pub async fn fetch(&self) -> Result<AgentMetadata, AgentMetadataError> {
        debug!("Fetching ECS agent metadata from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| AgentMetadataError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentMetadataError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| AgentMetadataError::Request {
                url: self.url.clone(),
                source,
            })?;
        let metadata: AgentMetadata = serde_json::from_slice(&body)?;

        info!(
            "Local ECS agent {} - cluster: {}, container instance: {}",
            metadata.version, metadata.cluster, metadata.container_instance_arn
        );
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_decoding() {
        let body = r#"{
            "Cluster": "default",
            "ContainerInstanceArn": "arn:aws:ecs:us-east-1:012345678910:container-instance/c9c9a6f2",
            "Version": "Amazon ECS Agent - v1.14.1"
        }"#;
        let metadata: AgentMetadata = serde_json::from_str(body).unwrap();
        assert_eq!(metadata.cluster, "default");
        assert!(metadata.container_instance_arn.ends_with("c9c9a6f2"));
    }

    #[test]
    fn test_metadata_requires_cluster() {
        let body = r#"{"ContainerInstanceArn": "arn", "Version": "v1"}"#;
        assert!(serde_json::from_str::<AgentMetadata>(body).is_err());
    }
}
