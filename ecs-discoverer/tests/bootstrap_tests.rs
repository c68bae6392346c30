use ecs_discoverer::agent::AgentMetadataClient;
use ecs_discoverer::bootstrap::bootstrap;
use ecs_discoverer::cli::ClusterTarget;
use ecs_discoverer::error::AgentMetadataError;
use ecs_discoverer::DiscoveryError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SELF_ARN: &str = "arn:aws:ecs:eu-west-1:123456789012:container-instance/4b6d45ea";

fn client_for(mock: &MockServer) -> AgentMetadataClient {
    AgentMetadataClient::new(format!("{}/v1/metadata", mock.uri()), Duration::from_secs(2))
}

#[tokio::test]
async fn test_own_cluster_uses_agent_metadata() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Cluster": "consul-cluster",
            "ContainerInstanceArn": SELF_ARN,
            "Version": "Amazon ECS Agent - v1.14.1 (467c3d7)"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let boot = bootstrap(ClusterTarget::Own, "consul", &client_for(&mock))
        .await
        .unwrap();

    assert_eq!(boot.request.cluster, "consul-cluster");
    assert_eq!(boot.request.service, "consul");
    assert_eq!(boot.request.self_host_id.as_deref(), Some(SELF_ARN));
    assert!(!boot.request.verify_cluster);
    assert_eq!(boot.region, None);
}

#[tokio::test]
async fn test_remote_cluster_never_contacts_agent() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Cluster": "local",
            "ContainerInstanceArn": SELF_ARN,
            "Version": "v1"
        })))
        .expect(0)
        .mount(&mock)
        .await;

    let target = ClusterTarget::Remote {
        cluster: "prod".to_string(),
        region: "us-west-2".to_string(),
    };
    let boot = bootstrap(target, "nginx", &client_for(&mock)).await.unwrap();

    assert_eq!(boot.request.cluster, "prod");
    assert_eq!(boot.request.self_host_id, None);
    assert!(boot.request.verify_cluster);
    assert_eq!(boot.region.as_deref(), Some("us-west-2"));
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_agent_failure_aborts_bootstrap() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/metadata"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent not ready"))
        .expect(1)
        .mount(&mock)
        .await;

    let err = bootstrap(ClusterTarget::Own, "consul", &client_for(&mock))
        .await
        .unwrap_err();

    match err {
        DiscoveryError::AgentMetadata(AgentMetadataError::Status { status, .. }) => {
            assert_eq!(status, 500)
        }
        other => panic!("Expected AgentMetadata error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_agent_metadata_aborts_bootstrap() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Version": "v1"})))
        .mount(&mock)
        .await;

    let err = bootstrap(ClusterTarget::Own, "consul", &client_for(&mock))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::AgentMetadata(AgentMetadataError::Decode(_))
    ));
}
