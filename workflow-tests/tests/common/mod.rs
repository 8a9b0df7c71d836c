//! Common test utilities for workflow tests.

use workflow_tests::WorkflowTestContext;

/// Fresh context with a signed-in user holding `access-1`.
pub async fn setup() -> WorkflowTestContext {
    let ctx = WorkflowTestContext::new()
        .await
        .expect("Failed to create workflow test context");
    ctx.login("access-1").await.expect("Failed to log in");
    ctx
}
