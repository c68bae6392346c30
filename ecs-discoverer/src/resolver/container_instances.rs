use super::paging::batches;
use super::Resolver;
use crate::control_plane::{ContainerInstance, ControlPlane, CONTAINER_INSTANCE_ACTIVE};
use crate::error::{DiscoveryError, Stage};
use crate::sink::{DropReason, ExclusionSink};
use tracing::debug;

impl<P: ControlPlane + ?Sized> Resolver<'_, P> {
    /// EC2 instance ids behind the ACTIVE container instances among `container_instance_arns`.
    pub async fn resolve_ec2_instance_ids(
        &self,
        cluster: &str,
        container_instance_arns: &[String],
    ) -> Result<Vec<String>, DiscoveryError> {
        let mut records = Vec::with_capacity(container_instance_arns.len());
        for batch in batches(container_instance_arns, self.limits.describe_batch_size) {
            let described = self
                .plane
                .describe_container_instances(cluster, batch)
                .await
                .map_err(|e| {
                    DiscoveryError::api("Cannot retrieve ECS container instance information", e)
                })?;
            records.extend(described);
        }

        if records.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::ContainerInstances,
                format!(
                    "No ECS container instances found with specified filter - cluster: {} - instances: {}",
                    cluster,
                    container_instance_arns.join(", ")
                ),
            ));
        }
        debug!("Described {} container instances", records.len());

        let result = filter_active_container_instances(&records, self.sink);
        if result.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::ActiveContainerInstances,
                "No ACTIVE ECS container instances found in result set, cannot proceed",
            ));
        }
        Ok(result)
    }
}

pub fn filter_active_container_instances(
    records: &[ContainerInstance],
    sink: &dyn ExclusionSink,
) -> Vec<String> {
    let mut result = Vec::new();
    for record in records {
        if record.status != CONTAINER_INSTANCE_ACTIVE {
            sink.excluded(
                Stage::ActiveContainerInstances,
                record
                    .ec2_instance_id
                    .as_deref()
                    .unwrap_or(record.container_instance_arn.as_str()),
                &DropReason::NotActive {
                    status: record.status.clone(),
                },
            );
            continue;
        }

        match &record.ec2_instance_id {
            Some(id) => result.push(id.clone()),
            None => sink.excluded(
                Stage::ActiveContainerInstances,
                &record.container_instance_arn,
                &DropReason::NoInstanceId,
            ),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SilentSink;

    fn record(arn: &str, ec2: Option<&str>, status: &str) -> ContainerInstance {
        ContainerInstance {
            container_instance_arn: arn.to_string(),
            ec2_instance_id: ec2.map(str::to_string),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_only_active_with_instance_id() {
        let records = vec![
            record("ci/1", Some("i-1"), "ACTIVE"),
            record("ci/2", Some("i-2"), "DRAINING"),
            record("ci/3", None, "ACTIVE"),
            record("ci/4", Some("i-4"), "INACTIVE"),
            record("ci/5", Some("i-5"), "ACTIVE"),
        ];
        assert_eq!(
            filter_active_container_instances(&records, &SilentSink),
            vec!["i-1", "i-5"]
        );
    }
}
