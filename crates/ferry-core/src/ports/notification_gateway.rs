//! NotificationGateway port - optional local alerts.

use async_trait::async_trait;

use crate::domain::{Alert, GatewayError};

/// Fire-and-forget alert delivery.
///
/// Return `GatewayError::Unavailable` when the host has no such capability;
/// the queue then stops calling the gateway for the rest of its life.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(&self, alert: Alert) -> Result<(), GatewayError>;
}

/// Default gateway: accepts and drops every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGateway;

#[async_trait]
impl NotificationGateway for NoopGateway {
    async fn notify(&self, _alert: Alert) -> Result<(), GatewayError> {
        Ok(())
    }
}
