/*!
Builders for consistent cluster topologies

A host is one container instance backed by one EC2 instance. Identifiers are
derived from the host name so tests can refer to them directly:
- container instance: `arn:aws:ecs:us-east-1:123456789012:container-instance/<cluster>/<host>`
- EC2 instance: `i-<host>`
*/

use crate::control_plane_stub::StubControlPlane;
use ecs_discoverer::control_plane::{ContainerInstance, Ec2Instance, Reservation, TaskPlacement};

pub fn container_instance_arn(cluster: &str, host: &str) -> String {
    format!("arn:aws:ecs:us-east-1:123456789012:container-instance/{}/{}", cluster, host)
}

pub fn instance_id(host: &str) -> String {
    format!("i-{}", host)
}

pub fn task_arn(cluster: &str, n: usize) -> String {
    format!("arn:aws:ecs:us-east-1:123456789012:task/{}/{:08x}", cluster, n)
}

/// One worker host
#[derive(Debug, Clone)]
pub struct HostSpec {
    pub name: String,
    pub private_ip: Option<String>,
    pub container_status: String,
    pub instance_state: String,
    pub has_instance_record: bool,
}

impl HostSpec {
    /// ACTIVE container instance on a running EC2 instance
    pub fn new(name: &str, private_ip: &str) -> Self {
        Self {
            name: name.to_string(),
            private_ip: Some(private_ip.to_string()),
            container_status: "ACTIVE".to_string(),
            instance_state: "running".to_string(),
            has_instance_record: true,
        }
    }

    pub fn container_status(mut self, status: &str) -> Self {
        self.container_status = status.to_string();
        self
    }

    pub fn instance_state(mut self, state: &str) -> Self {
        self.instance_state = state.to_string();
        self
    }

    pub fn without_private_ip(mut self) -> Self {
        self.private_ip = None;
        self
    }

    /// EC2 no longer knows the instance (terminated and purged)
    pub fn without_instance_record(mut self) -> Self {
        self.has_instance_record = false;
        self
    }
}

/// Builds a [`StubControlPlane`] holding one cluster and one service
pub struct ClusterBuilder {
    cluster: String,
    service: String,
    hosts: Vec<HostSpec>,
    tasks: Vec<(Option<String>, String)>,
    instances_per_reservation: usize,
}

impl ClusterBuilder {
    pub fn new(cluster: &str, service: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            service: service.to_string(),
            hosts: Vec::new(),
            tasks: Vec::new(),
            instances_per_reservation: 1,
        }
    }

    pub fn host(mut self, host: HostSpec) -> Self {
        self.hosts.push(host);
        self
    }

    /// Task placed on `host`; the host does not have to be declared
    pub fn task(mut self, host: &str, status: &str) -> Self {
        self.tasks.push((Some(host.to_string()), status.to_string()));
        self
    }

    pub fn running_task(self, host: &str) -> Self {
        self.task(host, "RUNNING")
    }

    /// Task without a container instance (Fargate)
    pub fn unplaced_task(mut self, status: &str) -> Self {
        self.tasks.push((None, status.to_string()));
        self
    }

    /// Group EC2 instances into reservations of `count`
    pub fn instances_per_reservation(mut self, count: usize) -> Self {
        self.instances_per_reservation = count.max(1);
        self
    }

    pub fn container_instance_arn(&self, host: &str) -> String {
        container_instance_arn(&self.cluster, host)
    }

    pub fn build(self) -> StubControlPlane {
        let stub = StubControlPlane::new();
        stub.add_cluster(&self.cluster);
        stub.add_service(&self.service);

        for (n, (host, status)) in self.tasks.iter().enumerate() {
            stub.add_task(TaskPlacement {
                task_arn: task_arn(&self.cluster, n),
                container_instance_arn: host
                    .as_deref()
                    .map(|h| container_instance_arn(&self.cluster, h)),
                last_status: status.clone(),
            });
        }

        for host in &self.hosts {
            stub.add_container_instance(ContainerInstance {
                container_instance_arn: container_instance_arn(&self.cluster, &host.name),
                ec2_instance_id: Some(instance_id(&host.name)),
                status: host.container_status.clone(),
            });
        }

        let instances: Vec<Ec2Instance> = self
            .hosts
            .iter()
            .filter(|h| h.has_instance_record)
            .map(|h| Ec2Instance {
                instance_id: instance_id(&h.name),
                state: h.instance_state.clone(),
                private_ip: h.private_ip.clone(),
            })
            .collect();
        for chunk in instances.chunks(self.instances_per_reservation) {
            stub.add_reservation(Reservation {
                instances: chunk.to_vec(),
            });
        }

        stub
    }
}
