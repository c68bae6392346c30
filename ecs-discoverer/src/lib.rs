//! ECS peer discovery
//!
//! Resolves an ECS service to the private IPs of the other EC2 hosts running
//! it, so a process starting on one host can join the rest (Consul servers,
//! gossip clusters, ...).
//!
//! - [`agent`]: identification of the local host through the ECS agent
//! - [`bootstrap`]: own or remote cluster, as a [`ResolutionRequest`]
//! - [`resolver`]: the service → tasks → container instances → EC2 → IPs pipeline
//! - [`aws`]: the AWS SDK implementation of [`control_plane::ControlPlane`]

pub mod agent;
pub mod aws;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod control_plane;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod sink;

pub use control_plane::ControlPlane;
pub use error::{ApiError, DiscoveryError, Stage};
pub use resolver::{ResolutionRequest, Resolver};
