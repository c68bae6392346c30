/*!
# ecs-discoverer devkit - stubs and helpers for development

Library making it easy to exercise the discovery pipeline without AWS:
- Stub ECS/EC2 control plane recording every call
- Builders for consistent cluster topologies
- Recording exclusion sink and test harness
*/

pub mod control_plane_stub;
pub mod fixtures;
pub mod test_utils;

pub use control_plane_stub::{Call, Operation, StubControlPlane};
pub use fixtures::{ClusterBuilder, HostSpec};
pub use test_utils::{Exclusion, RecordingSink, TestHarness};
