use super::Resolver;
use crate::control_plane::ControlPlane;
use crate::error::DiscoveryError;
use tracing::debug;

impl<P: ControlPlane + ?Sized> Resolver<'_, P> {
    /// Verify that the ECS cluster exists, exactly once.
    pub async fn verify_cluster_exists(&self, cluster: &str) -> Result<(), DiscoveryError> {
        let clusters = self
            .plane
            .describe_clusters(&[cluster.to_string()])
            .await
            .map_err(|e| DiscoveryError::api("Cannot verify if ECS cluster exists", e))?;

        match clusters.len() {
            0 => Err(DiscoveryError::NotFound(format!(
                "ECS Cluster '{}' does not exist, cannot proceed",
                cluster
            ))),
            1 => {
                debug!("ECS cluster {} exists", cluster);
                Ok(())
            }
            n => {
                let names: Vec<&str> = clusters.iter().map(|c| c.cluster_name.as_str()).collect();
                Err(DiscoveryError::Inconsistent(format!(
                    "{} ECS clusters returned when searching for '{}': {}",
                    n,
                    cluster,
                    names.join(", ")
                )))
            }
        }
    }

    /// Verify that the ECS service can be described.
    ///
    /// Only a failing call is an error: an empty answer is accepted and the
    /// task listing reports the missing service instead.
    pub async fn verify_service_exists(&self, cluster: &str, service: &str) -> Result<(), DiscoveryError> {
        let services = self
            .plane
            .describe_services(cluster, &[service.to_string()])
            .await
            .map_err(|e| DiscoveryError::api("Cannot verify if ECS service exists", e))?;

        debug!("DescribeServices returned {} records for {}", services.len(), service);
        Ok(())
    }
}
