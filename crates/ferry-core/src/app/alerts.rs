//! AlertSink - best-effort delivery through the notification gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::domain::{Alert, GatewayError};
use crate::ports::NotificationGateway;

/// Wraps the gateway so that the loop never sees its failures.
///
/// The first `GatewayError::Unavailable` is logged and cached; after that
/// every alert is dropped without calling the gateway again.
pub struct AlertSink {
    gateway: Arc<dyn NotificationGateway>,
    unavailable: AtomicBool,
}

impl AlertSink {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self {
            gateway,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::Relaxed)
    }

    pub async fn send(&self, alert: Alert) {
        if !self.is_available() {
            return;
        }
        match self.gateway.notify(alert).await {
            Ok(()) => {}
            Err(GatewayError::Unavailable) => {
                if !self.unavailable.swap(true, Ordering::Relaxed) {
                    info!("notification gateway unavailable; alerts disabled");
                }
            }
            Err(e) => warn!(error = %e, "alert delivery failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use ulid::Ulid;

    struct Flaky {
        calls: AtomicUsize,
        error: fn() -> GatewayError,
    }

    #[async_trait]
    impl NotificationGateway for Flaky {
        async fn notify(&self, _alert: Alert) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    fn alert() -> Alert {
        Alert::failed(ItemId::from_ulid(Ulid::new()), "a.pdf", "boom")
    }

    #[tokio::test]
    async fn unavailable_gateway_is_called_once() {
        let gateway = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
            error: || GatewayError::Unavailable,
        });
        let sink = AlertSink::new(gateway.clone());

        sink.send(alert()).await;
        sink.send(alert()).await;
        sink.send(alert()).await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert!(!sink.is_available());
    }

    #[tokio::test]
    async fn delivery_errors_keep_gateway_enabled() {
        let gateway = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
            error: || GatewayError::Delivery("quota".into()),
        });
        let sink = AlertSink::new(gateway.clone());

        sink.send(alert()).await;
        sink.send(alert()).await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
        assert!(sink.is_available());
    }
}
