use async_trait::async_trait;
use tracing::info;

use crate::domain::{Alert, GatewayError};
use crate::ports::NotificationGateway;

/// Delivers alerts as `info` log lines on the `ferry::alert` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingGateway;

#[async_trait]
impl NotificationGateway for TracingGateway {
    async fn notify(&self, alert: Alert) -> Result<(), GatewayError> {
        info!(target: "ferry::alert", title = %alert.title, data = %alert.data, "{}", alert.body);
        Ok(())
    }
}
