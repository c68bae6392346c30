/*!
Test harness for the discovery pipeline

Facilitates tests with:
- A stub control plane wired into a resolver
- A sink recording every excluded candidate
- Assertions on the calls the pipeline made
*/

use crate::control_plane_stub::{Operation, StubControlPlane};
use ecs_discoverer::config::LimitsConfig;
use ecs_discoverer::resolver::{join_line, ResolutionRequest, Resolver};
use ecs_discoverer::sink::{DropReason, ExclusionSink};
use ecs_discoverer::{DiscoveryError, Stage};
use std::sync::Mutex;

/// One excluded candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub stage: Stage,
    pub id: String,
    pub reason: DropReason,
}

/// Sink keeping every exclusion for assertions
#[derive(Default)]
pub struct RecordingSink {
    exclusions: Mutex<Vec<Exclusion>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclusions(&self) -> Vec<Exclusion> {
        self.exclusions.lock().unwrap().clone()
    }

    pub fn excluded_ids(&self, stage: Stage) -> Vec<String> {
        self.exclusions
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.id.clone())
            .collect()
    }
}

impl ExclusionSink for RecordingSink {
    fn excluded(&self, stage: Stage, id: &str, reason: &DropReason) {
        tracing::debug!("[STUB] {} excluded at {}: {}", id, stage, reason);
        self.exclusions.lock().unwrap().push(Exclusion {
            stage,
            id: id.to_string(),
            reason: reason.clone(),
        });
    }
}

/// Complete harness: stub control plane + recording sink + limits
pub struct TestHarness {
    pub plane: StubControlPlane,
    pub sink: RecordingSink,
    pub limits: LimitsConfig,
}

impl TestHarness {
    pub fn new(plane: StubControlPlane) -> Self {
        // Init logging for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ecs_discoverer=debug")
            .with_test_writer()
            .try_init();

        Self {
            plane,
            sink: RecordingSink::new(),
            limits: LimitsConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn resolver(&self) -> Resolver<'_, StubControlPlane> {
        Resolver::new(&self.plane, &self.sink).with_limits(self.limits)
    }

    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<String>, DiscoveryError> {
        self.resolver().resolve(request).await
    }

    /// The line the binary would print
    pub async fn resolve_line(&self, request: &ResolutionRequest) -> Result<String, DiscoveryError> {
        let addresses = self.resolve(request).await?;
        Ok(join_line(&addresses))
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.plane.calls_to(operation).len()
    }

    /// Largest identifier list sent to `operation`
    pub fn largest_batch(&self, operation: Operation) -> usize {
        self.plane
            .calls_to(operation)
            .iter()
            .map(|call| call.ids.len())
            .max()
            .unwrap_or(0)
    }

    pub fn assert_not_called(&self, operation: Operation) {
        let calls = self.plane.calls_to(operation);
        assert!(calls.is_empty(), "{:?} unexpectedly called: {:?}", operation, calls);
    }
}
