/*!
Stub ECS/EC2 control plane for development without AWS

Holds a whole cluster in memory, answers the same calls as the real APIs
(page cursors, the 100-item describe limit, EC2 reservations) and records
every call for assertions.
*/

use async_trait::async_trait;
use ecs_discoverer::control_plane::{
    ClusterRecord, ContainerInstance, ControlPlane, Page, Reservation, ServiceRecord,
    TaskPlacement, MAX_DESCRIBE_BATCH,
};
use ecs_discoverer::ApiError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Control-plane operations, used to inject failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DescribeClusters,
    DescribeServices,
    ListTasks,
    DescribeTasks,
    DescribeContainerInstances,
    DescribeInstances,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub ids: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Default)]
struct StubState {
    clusters: Vec<ClusterRecord>,
    services: Vec<ServiceRecord>,
    tasks: Vec<TaskPlacement>,
    container_instances: Vec<ContainerInstance>,
    reservations: Vec<Reservation>,
    list_page_size: Option<usize>,
    reservations_per_page: Option<usize>,
    repeat_list_cursor: bool,
    hide_task_details: bool,
    failures: HashMap<Operation, ApiError>,
    calls: Vec<Call>,
}

/// In-memory stand-in for ECS + EC2
#[derive(Clone, Default)]
pub struct StubControlPlane {
    state: Arc<Mutex<StubState>>,
}

impl StubControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cluster(&self, name: &str) {
        self.state.lock().unwrap().clusters.push(ClusterRecord {
            cluster_name: name.to_string(),
            cluster_arn: Some(format!("arn:aws:ecs:us-east-1:123456789012:cluster/{}", name)),
            status: Some("ACTIVE".to_string()),
        });
    }

    pub fn add_service(&self, name: &str) {
        self.state.lock().unwrap().services.push(ServiceRecord {
            service_name: name.to_string(),
            status: Some("ACTIVE".to_string()),
        });
    }

    pub fn add_task(&self, task: TaskPlacement) {
        self.state.lock().unwrap().tasks.push(task);
    }

    pub fn add_container_instance(&self, record: ContainerInstance) {
        self.state.lock().unwrap().container_instances.push(record);
    }

    pub fn add_reservation(&self, reservation: Reservation) {
        self.state.lock().unwrap().reservations.push(reservation);
    }

    /// Task ARNs per ListTasks page (the real API defaults to 100)
    pub fn set_list_page_size(&self, size: usize) {
        self.state.lock().unwrap().list_page_size = Some(size.max(1));
    }

    pub fn set_reservations_per_page(&self, count: usize) {
        self.state.lock().unwrap().reservations_per_page = Some(count.max(1));
    }

    /// ListTasks keeps handing back the same cursor
    pub fn repeat_list_cursor(&self) {
        self.state.lock().unwrap().repeat_list_cursor = true;
    }

    /// DescribeTasks answers with no task records (tasks gone between calls)
    pub fn hide_task_details(&self) {
        self.state.lock().unwrap().hide_task_details = true;
    }

    /// Make every call to `operation` fail with `error`
    pub fn fail(&self, operation: Operation, error: ApiError) {
        self.state.lock().unwrap().failures.insert(operation, error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, operation: Operation) -> Vec<Call> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Record the call, then return the injected failure if any
    fn enter(
        &self,
        operation: Operation,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<std::sync::MutexGuard<'_, StubState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            operation,
            ids: ids.to_vec(),
            next_token,
        });
        match state.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

fn check_batch(ids: &[String]) -> Result<(), ApiError> {
    if ids.len() > MAX_DESCRIBE_BATCH {
        return Err(ApiError::new(format!(
            "{} identifiers requested, at most {} allowed",
            ids.len(),
            MAX_DESCRIBE_BATCH
        ))
        .with_code("InvalidParameterException")
        .with_status(400));
    }
    Ok(())
}

fn parse_offset(token: Option<&str>, prefix: &str) -> Result<usize, ApiError> {
    match token {
        None => Ok(0),
        Some(token) => token
            .strip_prefix(prefix)
            .and_then(|offset| offset.parse().ok())
            .ok_or_else(|| ApiError::new("invalid next token").with_code("InvalidParameterException")),
    }
}

#[async_trait]
impl ControlPlane for StubControlPlane {
    async fn describe_clusters(&self, clusters: &[String]) -> Result<Vec<ClusterRecord>, ApiError> {
        let state = self.enter(Operation::DescribeClusters, clusters, None)?;
        Ok(state
            .clusters
            .iter()
            .filter(|c| {
                clusters
                    .iter()
                    .any(|wanted| *wanted == c.cluster_name || Some(wanted) == c.cluster_arn.as_ref())
            })
            .cloned()
            .collect())
    }

    async fn describe_services(
        &self,
        _cluster: &str,
        services: &[String],
    ) -> Result<Vec<ServiceRecord>, ApiError> {
        let state = self.enter(Operation::DescribeServices, services, None)?;
        Ok(state
            .services
            .iter()
            .filter(|s| services.contains(&s.service_name))
            .cloned()
            .collect())
    }

    async fn list_tasks(
        &self,
        _cluster: &str,
        _service: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ApiError> {
        let state = self.enter(Operation::ListTasks, &[], next_token.clone())?;
        let page_size = state.list_page_size.unwrap_or(MAX_DESCRIBE_BATCH);

        if state.repeat_list_cursor {
            return Ok(Page {
                items: state.tasks.iter().take(1).map(|t| t.task_arn.clone()).collect(),
                next_token: Some("stuck".to_string()),
            });
        }

        let offset = parse_offset(next_token.as_deref(), "tasks-")?;
        let items: Vec<String> = state
            .tasks
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|t| t.task_arn.clone())
            .collect();
        let end = offset + items.len();
        let next_token = (end < state.tasks.len()).then(|| format!("tasks-{}", end));

        Ok(Page { items, next_token })
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskPlacement>, ApiError> {
        let state = self.enter(Operation::DescribeTasks, task_arns, None)?;
        check_batch(task_arns)?;
        if state.hide_task_details {
            return Ok(Vec::new());
        }

        Ok(task_arns
            .iter()
            .filter_map(|arn| state.tasks.iter().find(|t| t.task_arn == *arn).cloned())
            .collect())
    }

    async fn describe_container_instances(
        &self,
        _cluster: &str,
        container_instance_arns: &[String],
    ) -> Result<Vec<ContainerInstance>, ApiError> {
        let state = self.enter(
            Operation::DescribeContainerInstances,
            container_instance_arns,
            None,
        )?;
        check_batch(container_instance_arns)?;

        Ok(container_instance_arns
            .iter()
            .filter_map(|arn| {
                state
                    .container_instances
                    .iter()
                    .find(|ci| ci.container_instance_arn == *arn)
                    .cloned()
            })
            .collect())
    }

    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<Reservation>, ApiError> {
        let state = self.enter(Operation::DescribeInstances, instance_ids, next_token.clone())?;

        // An id requested twice comes back twice
        let matching: Vec<Reservation> = state
            .reservations
            .iter()
            .map(|r| Reservation {
                instances: r
                    .instances
                    .iter()
                    .flat_map(|i| {
                        let times = instance_ids.iter().filter(|id| **id == i.instance_id).count();
                        std::iter::repeat(i.clone()).take(times)
                    })
                    .collect(),
            })
            .filter(|r| !r.instances.is_empty())
            .collect();

        let per_page = state.reservations_per_page.unwrap_or(usize::MAX);
        let offset = parse_offset(next_token.as_deref(), "reservations-")?;
        let items: Vec<Reservation> = matching.iter().skip(offset).take(per_page).cloned().collect();
        let end = offset + items.len();
        let next_token = (end < matching.len()).then(|| format!("reservations-{}", end));

        Ok(Page { items, next_token })
    }
}
