//! ECS Discoverer - join list for the peers of an ECS service
//!
//! Searches for every other host running the given ECS service and prints
//! their private IPs on one line, so that a new process (a Consul server for
//! instance) can join the existing cluster:
//! - Own cluster: cluster and container instance read from the local ECS agent
//! - Remote cluster: `--cluster` + `--region`, nothing excluded
//!
//! Designed to run on EC2 within an ECS cluster, inside a Docker container
//! with the default networking topology.

use anyhow::{Context, Result};
use clap::Parser;
use ecs_discoverer::agent::AgentMetadataClient;
use ecs_discoverer::aws::{self, AwsControlPlane};
use ecs_discoverer::bootstrap::{bootstrap, Bootstrap};
use ecs_discoverer::cli::Cli;
use ecs_discoverer::config::DiscovererConfig;
use ecs_discoverer::resolver::{join_line, Resolver};
use ecs_discoverer::{logging, sink};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit here, before any network call
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    match run(cli).await {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            // stdout only ever carries the address line and debug logs
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = DiscovererConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    debug!("Configuration: {:?}", config);

    let agent = AgentMetadataClient::new(
        config.agent.metadata_url.clone(),
        Duration::from_secs(config.agent.timeout_secs),
    );
    let Bootstrap { request, region } = bootstrap(cli.target(), &cli.service, &agent).await?;
    let request = request.with_dedup(cli.dedup || config.output.dedup);

    let sdk_config = aws::load_sdk_config(region.as_deref()).await?;
    let plane = AwsControlPlane::new(&sdk_config);
    let sink = sink::for_debug(cli.debug);

    let addresses = Resolver::new(&plane, &*sink)
        .with_limits(config.limits)
        .resolve(&request)
        .await?;

    Ok(join_line(&addresses))
}
