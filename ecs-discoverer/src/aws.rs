//! [`ControlPlane`] backed by the AWS SDK.

use crate::control_plane::{
    ClusterRecord, ContainerInstance, ControlPlane, Ec2Instance, Page, Reservation, ServiceRecord,
    TaskPlacement,
};
use crate::error::{ApiError, DiscoveryError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use tracing::{debug, info};

/// Resolve credentials and region the usual SDK way.
///
/// An explicit region wins; otherwise the default chain applies (environment,
/// profile, then EC2 instance metadata).
pub async fn load_sdk_config(region: Option<&str>) -> Result<SdkConfig, DiscoveryError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_sdk_ecs::config::Region::new(region.to_string()));
    }
    let config = loader.load().await;

    match config.region() {
        Some(region) => {
            info!("Using AWS region {}", region);
            Ok(config)
        }
        None => Err(DiscoveryError::Config(
            "cannot determine AWS region from environment, profile or EC2 metadata".to_string(),
        )),
    }
}

#[derive(Clone, Debug)]
pub struct AwsControlPlane {
    ecs: aws_sdk_ecs::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsControlPlane {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            ecs: aws_sdk_ecs::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait]
impl ControlPlane for AwsControlPlane {
    async fn describe_clusters(&self, clusters: &[String]) -> Result<Vec<ClusterRecord>, ApiError> {
        let resp = self
            .ecs
            .describe_clusters()
            .set_clusters(Some(clusters.to_vec()))
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        for failure in resp.failures() {
            debug!("DescribeClusters failure: {:?} {:?}", failure.arn(), failure.reason());
        }

        Ok(resp
            .clusters()
            .iter()
            .map(|c| ClusterRecord {
                cluster_name: c.cluster_name().unwrap_or_default().to_string(),
                cluster_arn: c.cluster_arn().map(str::to_string),
                status: c.status().map(str::to_string),
            })
            .collect())
    }

    async fn describe_services(
        &self,
        cluster: &str,
        services: &[String],
    ) -> Result<Vec<ServiceRecord>, ApiError> {
        let resp = self
            .ecs
            .describe_services()
            .cluster(cluster)
            .set_services(Some(services.to_vec()))
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        Ok(resp
            .services()
            .iter()
            .map(|s| ServiceRecord {
                service_name: s.service_name().unwrap_or_default().to_string(),
                status: s.status().map(str::to_string),
            })
            .collect())
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        service: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ApiError> {
        let resp = self
            .ecs
            .list_tasks()
            .cluster(cluster)
            .service_name(service)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        Ok(Page {
            items: resp.task_arns().to_vec(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskPlacement>, ApiError> {
        let resp = self
            .ecs
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(task_arns.to_vec()))
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        for failure in resp.failures() {
            debug!("DescribeTasks failure: {:?} {:?}", failure.arn(), failure.reason());
        }

        Ok(resp
            .tasks()
            .iter()
            .map(|t| TaskPlacement {
                task_arn: t.task_arn().unwrap_or_default().to_string(),
                container_instance_arn: t.container_instance_arn().map(str::to_string),
                last_status: t.last_status().unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn describe_container_instances(
        &self,
        cluster: &str,
        container_instance_arns: &[String],
    ) -> Result<Vec<ContainerInstance>, ApiError> {
        let resp = self
            .ecs
            .describe_container_instances()
            .cluster(cluster)
            .set_container_instances(Some(container_instance_arns.to_vec()))
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        for failure in resp.failures() {
            debug!(
                "DescribeContainerInstances failure: {:?} {:?}",
                failure.arn(),
                failure.reason()
            );
        }

        Ok(resp
            .container_instances()
            .iter()
            .map(|ci| ContainerInstance {
                container_instance_arn: ci.container_instance_arn().unwrap_or_default().to_string(),
                ec2_instance_id: ci.ec2_instance_id().map(str::to_string),
                status: ci.status().unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<Reservation>, ApiError> {
        let resp = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(ApiError::from_sdk)?;

        let items = resp
            .reservations()
            .iter()
            .map(|r| Reservation {
                instances: r
                    .instances()
                    .iter()
                    .map(|i| Ec2Instance {
                        instance_id: i.instance_id().unwrap_or_default().to_string(),
                        state: i
                            .state()
                            .and_then(|s| s.name())
                            .map(|name| name.as_str().to_string())
                            .unwrap_or_default(),
                        private_ip: i.private_ip_address().map(str::to_string),
                    })
                    .collect(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }
}
