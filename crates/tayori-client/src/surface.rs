//! Notifications surface: the push channel plus read receipts.
//!
//! Mounting opens the channel. While the popover is visible, the first
//! unread counter seen after it became visible is acknowledged once
//! through `notifications/readed`; staying open does not re-fire, closing
//! and reopening re-arms.

use std::sync::Arc;

use tayori_store::{Domain, StoreHandle};
use tayori_store::domains::Notifications;
use tayori_types::GroupCount;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::operations::notifications;
use crate::realtime::{ChannelConfig, ChannelHandle};
use crate::runner::ActionRunner;
use crate::service::Service;
use crate::transport::PushConnector;

/// One-shot latch for read receipts, armed by a hidden → visible edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadGate {
    visible: bool,
    armed: bool,
}

impl ReadGate {
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.armed = true;
        }
        if !visible {
            self.armed = false;
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a read receipt should go out for `counter`. Disarms on `true`.
    pub fn poll(&mut self, counter: &GroupCount) -> bool {
        if self.visible && self.armed && counter.has_unread() {
            self.armed = false;
            return true;
        }
        false
    }
}

/// A mounted notifications surface.
pub struct NotificationsSurface {
    channel: ChannelHandle,
    visible: mpsc::UnboundedSender<bool>,
    cancel: CancellationToken,
    receipts: Option<JoinHandle<()>>,
}

impl NotificationsSurface {
    pub fn mount(
        connector: Arc<dyn PushConnector>,
        config: ChannelConfig,
        runner: ActionRunner,
        service: Arc<dyn Service>,
    ) -> Self {
        let channel = ChannelHandle::spawn(connector, config, runner.store().clone());
        let (visible, visible_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let receipts = tokio::spawn(read_receipts(runner, service, visible_rx, cancel.clone()));

        Self { channel, visible, cancel, receipts: Some(receipts) }
    }

    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }

    /// Popover shown or hidden. Every call is seen, so quick hide/show
    /// pairs still re-arm the read receipt.
    pub fn set_visible(&self, visible: bool) {
        if self.visible.send(visible).is_err() {
            tracing::debug!("read receipt task already stopped");
        }
    }

    /// Tear down the channel and the receipt task.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        self.channel.teardown().await;
        if let Some(task) = self.receipts.take() {
            let _ = task.await;
        }
    }
}

impl Drop for NotificationsSurface {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn current_count(store: &StoreHandle) -> Option<GroupCount> {
    store.read::<Notifications, _, _>(|n| n.group_count.clone()).await.ok()
}

async fn read_receipts(
    runner: ActionRunner,
    service: Arc<dyn Service>,
    mut visible: mpsc::UnboundedReceiver<bool>,
    cancel: CancellationToken,
) {
    let mut gate = ReadGate::default();
    let mut events = runner.store().subscribe();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            shown = visible.recv() => match shown {
                Some(shown) => gate.set_visible(shown),
                None => break,
            },
            event = events.recv() => match event {
                Ok(event) if event.touches(Notifications::NAME) => {}
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "store events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }

        let Some(counter) = current_count(runner.store()).await else { break };
        if !gate.poll(&counter) {
            continue;
        }

        tracing::debug!(count = counter.count, group = %counter.group, "acknowledging notifications");
        match notifications::read(&runner, service.as_ref()).await {
            Ok(envelope) if !envelope.is_ok() => {
                tracing::warn!(message = ?envelope.message, "read receipt refused");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "read receipt failed"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
