use super::paging::{batches, collect_pages};
use super::Resolver;
use crate::control_plane::{ControlPlane, TaskPlacement, TASK_RUNNING};
use crate::error::{DiscoveryError, Stage};
use crate::sink::{DropReason, ExclusionSink};
use tracing::debug;

impl<P: ControlPlane + ?Sized> Resolver<'_, P> {
    /// Container instances hosting a RUNNING task of `service`, minus `self_host_id`.
    pub async fn resolve_container_instance_arns(
        &self,
        cluster: &str,
        service: &str,
        self_host_id: Option<&str>,
    ) -> Result<Vec<String>, DiscoveryError> {
        let task_arns = collect_pages(
            "Cannot retrieve ECS task list",
            self.limits.max_pages,
            |token| self.plane.list_tasks(cluster, service, token),
        )
        .await?;

        if task_arns.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::TaskList,
                format!(
                    "No ECS tasks found with specified filter - cluster: {}, service: {}",
                    cluster, service
                ),
            ));
        }
        debug!("Found {} tasks for service {}", task_arns.len(), service);

        let mut placements = Vec::with_capacity(task_arns.len());
        for batch in batches(&task_arns, self.limits.describe_batch_size) {
            let described = self
                .plane
                .describe_tasks(cluster, batch)
                .await
                .map_err(|e| DiscoveryError::api("Cannot retrieve ECS task details", e))?;
            placements.extend(described);
        }

        if placements.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::TaskDetails,
                format!(
                    "No ECS task details found with specified filter - tasks: {}",
                    task_arns.join(", ")
                ),
            ));
        }

        let result = filter_task_placements(&placements, self_host_id, self.sink);
        if result.is_empty() {
            return Err(DiscoveryError::empty(
                Stage::RunningTasks,
                "No ECS task results found in RUNNING state, no running instances to return",
            ));
        }
        Ok(result)
    }
}

/// Container instance ARNs of RUNNING placements that are not on `self_host_id`.
pub fn filter_task_placements(
    placements: &[TaskPlacement],
    self_host_id: Option<&str>,
    sink: &dyn ExclusionSink,
) -> Vec<String> {
    let mut result = Vec::new();
    for task in placements {
        let Some(arn) = task.container_instance_arn.as_deref() else {
            sink.excluded(Stage::RunningTasks, &task.task_arn, &DropReason::NoContainerInstance);
            continue;
        };

        if task.last_status != TASK_RUNNING {
            sink.excluded(
                Stage::RunningTasks,
                arn,
                &DropReason::NotRunning {
                    status: task.last_status.clone(),
                },
            );
        } else if self_host_id == Some(arn) {
            sink.excluded(Stage::RunningTasks, arn, &DropReason::IsSelf);
        } else {
            result.push(arn.to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SilentSink;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(String, DropReason)>>);

    impl ExclusionSink for Collect {
        fn excluded(&self, _stage: Stage, id: &str, reason: &DropReason) {
            self.0.lock().unwrap().push((id.to_string(), reason.clone()));
        }
    }

    fn task(arn: &str, host: Option<&str>, status: &str) -> TaskPlacement {
        TaskPlacement {
            task_arn: arn.to_string(),
            container_instance_arn: host.map(str::to_string),
            last_status: status.to_string(),
        }
    }

    #[test]
    fn test_running_tasks_kept_in_order() {
        let tasks = vec![
            task("t1", Some("ci/b"), "RUNNING"),
            task("t2", Some("ci/a"), "RUNNING"),
            task("t3", Some("ci/b"), "RUNNING"),
        ];
        let result = filter_task_placements(&tasks, None, &SilentSink);
        assert_eq!(result, vec!["ci/b", "ci/a", "ci/b"]);
    }

    #[test]
    fn test_exclusion_reasons() {
        let tasks = vec![
            task("t1", Some("ci/self"), "RUNNING"),
            task("t2", Some("ci/2"), "STOPPED"),
            task("t3", None, "PROVISIONING"),
            task("t4", Some("ci/4"), "RUNNING"),
        ];
        let sink = Collect::default();
        let result = filter_task_placements(&tasks, Some("ci/self"), &sink);

        assert_eq!(result, vec!["ci/4"]);
        let dropped = sink.0.lock().unwrap();
        assert_eq!(
            *dropped,
            vec![
                ("ci/self".to_string(), DropReason::IsSelf),
                (
                    "ci/2".to_string(),
                    DropReason::NotRunning {
                        status: "STOPPED".to_string()
                    }
                ),
                ("t3".to_string(), DropReason::NoContainerInstance),
            ]
        );
    }

    #[test]
    fn test_status_comparison_is_exact() {
        let tasks = vec![task("t1", Some("ci/1"), "running")];
        assert!(filter_task_placements(&tasks, None, &SilentSink).is_empty());
    }
}
