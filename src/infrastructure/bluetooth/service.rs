//! Scale Service Module
//!
//! Main service that ties the GATT transport to the notification router
//! and publishes decoded records to the application.

use crate::domain::models::{Notification, PersonRecord, ScaleEvent};
use crate::domain::settings::ScaleSettings;
use crate::error::{Result, ScaleError};
use crate::infrastructure::bluetooth::{
    protocol::{self, CONTROL_HANDLE},
    router::{NotificationRouter, Routed},
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Outbound side of the BLE link. Connection setup, subscription and the
/// GATT protocol live behind this trait.
#[allow(async_fn_in_trait)]
pub trait GattTransport {
    /// Write `payload` to `handle` and wait for the device to acknowledge.
    async fn write_request(&self, handle: u16, payload: &[u8]) -> Result<()>;

    /// Tear down and re-establish the connection.
    async fn reconnect(&self) -> Result<()>;
}

/// Main service coordinating one scale session
pub struct ScaleService<T> {
    router: Arc<Mutex<NotificationRouter>>,
    transport: T,
    event_sender: mpsc::UnboundedSender<ScaleEvent>,
    write_timeout: Duration,
    reconnect_on_failure: bool,
}

impl<T: GattTransport> ScaleService<T> {
    /// Create a new scale service
    pub fn new(
        transport: T,
        settings: &ScaleSettings,
        event_sender: mpsc::UnboundedSender<ScaleEvent>,
    ) -> Self {
        Self {
            router: Arc::new(Mutex::new(NotificationRouter::with_policy(
                settings.history_policy,
            ))),
            transport,
            event_sender,
            write_timeout: Duration::from_secs(settings.write_timeout_secs),
            reconnect_on_failure: settings.reconnect_on_failure,
        }
    }

    /// Override the per-attempt write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn router(&self) -> Arc<Mutex<NotificationRouter>> {
        Arc::clone(&self.router)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Route one notification and publish what it produced
    pub fn handle_notification(&self, handle: u16, payload: &[u8]) -> Result<Routed> {
        let (routed, event) = {
            let mut router = self.router.lock().map_err(|_| ScaleError::LockPoisoned)?;
            let routed = router.handle_notification(handle, payload)?;
            let event = match routed {
                Routed::Person(id) => router
                    .get_person(id)
                    .cloned()
                    .map(ScaleEvent::PersonUpdated),
                Routed::Weight(id) => router
                    .get_person(id)
                    .and_then(|p| p.latest_weight().cloned())
                    .map(ScaleEvent::WeightRecorded),
                Routed::Body(id) => router
                    .get_person(id)
                    .and_then(|p| p.latest_body().cloned())
                    .map(ScaleEvent::BodyRecorded),
                Routed::Ignored(_) => None,
            };
            (routed, event)
        };

        if let Some(event) = event {
            let _ = self.event_sender.send(event);
        }
        Ok(routed)
    }

    /// Process notifications strictly in arrival order until the sender
    /// side is dropped. Rejected notifications are published as events.
    pub async fn run(&self, mut notifications: mpsc::UnboundedReceiver<Notification>) {
        info!("Listening for scale notifications");
        while let Some(notification) = notifications.recv().await {
            if let Err(e) = self.handle_notification(notification.handle, &notification.payload) {
                warn!(
                    "Rejected notification on {:#04x}: {}",
                    notification.handle, e
                );
                let _ = self.event_sender.send(ScaleEvent::NotificationRejected {
                    handle: notification.handle,
                    reason: e.to_string(),
                });
            }
        }
        info!("Notification stream closed");
    }

    /// Push the current time to the scale so it sends its stored data
    pub async fn update(&self) -> Result<()> {
        self.update_at(protocol::current_unix_time()).await
    }

    pub async fn update_at(&self, now_unix: u32) -> Result<()> {
        let payload = protocol::build_refresh_payload(now_unix);
        info!("Requesting measurements (time {})", now_unix);

        match self.write_once(&payload).await {
            Ok(()) => {}
            Err(e) if self.reconnect_on_failure => {
                warn!("Refresh write failed: {}. Reconnecting and retrying once...", e);
                self.transport.reconnect().await?;
                if let Err(e) = self.write_once(&payload).await {
                    error!("Refresh write failed after reconnect: {}", e);
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }

        let _ = self.event_sender.send(ScaleEvent::RefreshSent { now_unix });
        Ok(())
    }

    async fn write_once(&self, payload: &[u8]) -> Result<()> {
        match tokio::time::timeout(
            self.write_timeout,
            self.transport.write_request(CONTROL_HANDLE, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ScaleError::WriteTimeout(self.write_timeout)),
        }
    }

    /// Snapshot of one person's accumulated state
    pub fn person(&self, person_id: u8) -> Result<Option<PersonRecord>> {
        let router = self.router.lock().map_err(|_| ScaleError::LockPoisoned)?;
        Ok(router.get_person(person_id).cloned())
    }

    pub fn persons(&self) -> Result<Vec<PersonRecord>> {
        let router = self.router.lock().map_err(|_| ScaleError::LockPoisoned)?;
        Ok(router.registry().persons().cloned().collect())
    }
}
