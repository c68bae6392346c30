//! Turns the command line target into a resolution request.
//!
//! Own cluster: cluster and container instance come from the local ECS agent,
//! the region from the SDK default chain. Remote cluster: everything comes
//! from the flags and the agent is never contacted.

use crate::agent::AgentMetadataClient;
use crate::cli::ClusterTarget;
use crate::error::DiscoveryError;
use crate::resolver::ResolutionRequest;
use tracing::debug;

/// What the binary needs before talking to AWS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub request: ResolutionRequest,
    /// Explicit region; `None` leaves it to the SDK default chain.
    pub region: Option<String>,
}

pub async fn bootstrap(
    target: ClusterTarget,
    service: &str,
    agent: &AgentMetadataClient,
) -> Result<Bootstrap, DiscoveryError> {
    match target {
        ClusterTarget::Own => {
            let metadata = agent.fetch().await?;
            debug!(
                "Own cluster mode - cluster: {}, excluding {}",
                metadata.cluster, metadata.container_instance_arn
            );
            Ok(Bootstrap {
                request: ResolutionRequest::own_cluster(
                    metadata.cluster,
                    service,
                    metadata.container_instance_arn,
                ),
                region: None,
            })
        }
        ClusterTarget::Remote { cluster, region } => {
            debug!("Remote cluster mode - cluster: {}, region: {}", cluster, region);
            Ok(Bootstrap {
                request: ResolutionRequest::remote_cluster(cluster, service),
                region: Some(region),
            })
        }
    }
}
