use super::paging::collect_pages;
use super::Resolver;
use crate::control_plane::{ControlPlane, Ec2Instance, INSTANCE_RUNNING};
use crate::error::{DiscoveryError, Stage};
use crate::sink::{DropReason, ExclusionSink};
use tracing::debug;

impl<P: ControlPlane + ?Sized> Resolver<'_, P> {
    /// Private IPs of the running EC2 instances among `instance_ids`.
    pub async fn resolve_private_ips(&self, instance_ids: &[String]) -> Result<Vec<String>, DiscoveryError> {
        let reservations = collect_pages(
            "Cannot retrieve EC2 instance information",
            self.limits.max_pages,
            |token| self.plane.describe_instances(instance_ids, token),
        )
        .await?;

        let not_found = || {
            DiscoveryError::empty(
                Stage::Instances,
                format!(
                    "No EC2 instances found with specified Instance IDs filter: {}",
                    instance_ids.join(", ")
                ),
            )
        };

        if reservations.is_empty() {
            return Err(not_found());
        }

        let instances: Vec<Ec2Instance> = reservations
            .into_iter()
            .flat_map(|reservation| reservation.instances)
            .collect();
        if instances.is_empty() {
            return Err(not_found());
        }
        debug!("Described {} EC2 instances", instances.len());

        let result = filter_running_instances(&instances, self.sink);
        if result.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::RunningInstances,
                "No running EC2 instances found in result set, cannot proceed",
            ));
        }
        Ok(result)
    }
}

pub fn filter_running_instances(instances: &[Ec2Instance], sink: &dyn ExclusionSink) -> Vec<String> {
    let mut result = Vec::new();
    for instance in instances {
        if instance.state != INSTANCE_RUNNING {
            sink.excluded(
                Stage::RunningInstances,
                &instance.instance_id,
                &DropReason::NotRunning {
                    status: instance.state.clone(),
                },
            );
            continue;
        }

        match &instance.private_ip {
            Some(ip) => result.push(ip.clone()),
            None => sink.excluded(
                Stage::RunningInstances,
                &instance.instance_id,
                &DropReason::NoPrivateAddress,
            ),
        }
    }
    result
}
