//! Read-only view of the ECS and EC2 APIs used by the resolver.
//!
//! Each method maps to exactly one API call: one page of a paginated
//! listing, or one batch of a describe call. Following cursors and splitting
//! batches is the resolver's job, so implementations stay dumb.

use crate::error::ApiError;
use async_trait::async_trait;

pub const TASK_RUNNING: &str = "RUNNING";
pub const CONTAINER_INSTANCE_ACTIVE: &str = "ACTIVE";
pub const INSTANCE_RUNNING: &str = "running";

/// Largest identifier list DescribeTasks / DescribeContainerInstances accept.
pub const MAX_DESCRIBE_BATCH: usize = 100;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub cluster_name: String,
    pub cluster_arn: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub service_name: String,
    pub status: Option<String>,
}

/// A scheduled copy of the service, bound (or not yet) to a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlacement {
    pub task_arn: String,
    pub container_instance_arn: Option<String>,
    pub last_status: String,
}

/// ECS registration record of a worker host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInstance {
    pub container_instance_arn: String,
    pub ec2_instance_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub state: String,
    pub private_ip: Option<String>,
}

/// EC2 groups described instances by launch reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reservation {
    pub instances: Vec<Ec2Instance>,
}

#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn describe_clusters(&self, clusters: &[String]) -> Result<Vec<ClusterRecord>, ApiError>;

    async fn describe_services(
        &self,
        cluster: &str,
        services: &[String],
    ) -> Result<Vec<ServiceRecord>, ApiError>;

    /// One page of task ARNs for `service`.
    async fn list_tasks(
        &self,
        cluster: &str,
        service: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ApiError>;

    /// At most [`MAX_DESCRIBE_BATCH`] task ARNs per call.
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskPlacement>, ApiError>;

    /// At most [`MAX_DESCRIBE_BATCH`] container instance ARNs per call.
    async fn describe_container_instances(
        &self,
        cluster: &str,
        container_instance_arns: &[String],
    ) -> Result<Vec<ContainerInstance>, ApiError>;

    /// One page of reservations for the given instance ids.
    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<Reservation>, ApiError>;
}
