//! Peer resolution pipeline
//!
//! service → running tasks → container instances → EC2 instances → private IPs
//!
//! Each stage consumes the previous stage's identifiers and fails as soon as
//! it has nothing to hand over. Nothing here retries or exits the process.

mod checks;
mod container_instances;
mod instances;
pub mod paging;
mod tasks;

pub use container_instances::filter_active_container_instances;
pub use instances::filter_running_instances;
pub use tasks::filter_task_placements;

use crate::config::LimitsConfig;
use crate::control_plane::ControlPlane;
use crate::error::DiscoveryError;
use crate::sink::ExclusionSink;
use std::collections::HashSet;
use tracing::{debug, info};

/// Everything one invocation needs to know; built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub cluster: String,
    pub service: String,
    /// Container instance to leave out of the results. `None` excludes nothing.
    pub self_host_id: Option<String>,
    /// Remote clusters are checked for existence first; our own cluster exists by construction.
    pub verify_cluster: bool,
    pub dedup: bool,
}

impl ResolutionRequest {
    /// Discovery from inside the cluster, excluding the local container instance.
    pub fn own_cluster(
        cluster: impl Into<String>,
        service: impl Into<String>,
        container_instance_arn: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
            self_host_id: Some(container_instance_arn.into()),
            verify_cluster: false,
            dedup: false,
        }
    }

    /// Discovery against another cluster: nothing is excluded.
    pub fn remote_cluster(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
            self_host_id: None,
            verify_cluster: true,
            dedup: false,
        }
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

/// Runs the stages against a control plane, reporting exclusions to `sink`.
pub struct Resolver<'a, P: ControlPlane + ?Sized> {
    plane: &'a P,
    sink: &'a dyn ExclusionSink,
    limits: LimitsConfig,
}

impl<'a, P: ControlPlane + ?Sized> Resolver<'a, P> {
    pub fn new(plane: &'a P, sink: &'a dyn ExclusionSink) -> Self {
        Self {
            plane,
            sink,
            limits: LimitsConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Resolve the private IPs of the other hosts running `request.service`.
    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<String>, DiscoveryError> {
        info!(
            "Resolving peers for service {} in cluster {}",
            request.service, request.cluster
        );

        if request.verify_cluster {
            self.verify_cluster_exists(&request.cluster).await?;
        }
        self.verify_service_exists(&request.cluster, &request.service)
            .await?;

        let container_instances = self
            .resolve_container_instance_arns(
                &request.cluster,
                &request.service,
                request.self_host_id.as_deref(),
            )
            .await?;

        let instance_ids = self
            .resolve_ec2_instance_ids(&request.cluster, &container_instances)
            .await?;

        let mut private_ips = self.resolve_private_ips(&instance_ids).await?;

        if request.dedup {
            let before = private_ips.len();
            dedup_in_order(&mut private_ips);
            debug!("Deduplicated {} addresses down to {}", before, private_ips.len());
        }

        info!("Resolved {} peer addresses", private_ips.len());
        Ok(private_ips)
    }
}

/// Keep the first occurrence of every value.
pub fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|value| seen.insert(value.clone()));
}

/// Format the result as the single comma separated output line.
pub fn join_line(addresses: &[String]) -> String {
    addresses.join(",")
}
