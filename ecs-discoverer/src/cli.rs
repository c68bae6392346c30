//! Command line surface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "ecs-discoverer")]
#[command(
    about = "Prints the private IPs of the other EC2 hosts running an ECS service",
    long_about = "Resolves an ECS service to the private IPs of the EC2 hosts running its tasks, \
                  as a single comma separated line suitable for a join list. \
                  Without --cluster, the cluster is read from the local ECS agent and this host is excluded."
)]
pub struct Cli {
    /// ECS service name to resolve
    #[arg(short, long)]
    pub service: String,

    /// Remote ECS cluster to search instead of our own
    #[arg(short, long, requires = "region")]
    pub cluster: Option<String>,

    /// AWS region of the remote cluster
    #[arg(short, long, requires = "cluster")]
    pub region: Option<String>,

    /// Log every candidate excluded from the results
    #[arg(short, long)]
    pub debug: bool,

    /// Remove duplicate addresses from the output
    #[arg(long)]
    pub dedup: bool,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Which cluster the lookup targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTarget {
    /// The cluster this host belongs to, as reported by the local ECS agent.
    Own,
    Remote { cluster: String, region: String },
}

impl Cli {
    pub fn target(&self) -> ClusterTarget {
        match (&self.cluster, &self.region) {
            (Some(cluster), Some(region)) => ClusterTarget::Remote {
                cluster: cluster.clone(),
                region: region.clone(),
            },
            // clap rejects a cluster without a region and vice versa
            _ => ClusterTarget::Own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_remote_cluster_flags() {
        let cli = Cli::try_parse_from([
            "ecs-discoverer",
            "-c",
            "somecluster",
            "-r",
            "someregion",
            "-s",
            "someservice",
        ])
        .unwrap();
        assert_eq!(cli.service, "someservice");
        assert!(!cli.debug);
        assert_eq!(
            cli.target(),
            ClusterTarget::Remote {
                cluster: "somecluster".to_string(),
                region: "someregion".to_string(),
            }
        );
    }

    #[test]
    fn test_own_cluster_with_debug() {
        let cli = Cli::try_parse_from(["ecs-discoverer", "-s", "someotherservice", "-d"]).unwrap();
        assert_eq!(cli.service, "someotherservice");
        assert!(cli.debug);
        assert!(!cli.dedup);
        assert_eq!(cli.target(), ClusterTarget::Own);
    }

    #[test]
    fn test_cluster_requires_region() {
        let err = Cli::try_parse_from(["ecs-discoverer", "-s", "nginx", "-c", "prod"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_region_requires_cluster() {
        let err = Cli::try_parse_from(["ecs-discoverer", "-s", "nginx", "-r", "eu-west-1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_service_is_required() {
        let err = Cli::try_parse_from(["ecs-discoverer", "-d"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "ecs-discoverer",
            "--service",
            "consul",
            "--dedup",
            "--config",
            "/etc/ecs-discoverer.toml",
        ])
        .unwrap();
        assert!(cli.dedup);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ecs-discoverer.toml")));
    }
}
