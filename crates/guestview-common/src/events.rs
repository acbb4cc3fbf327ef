//! Guest lifecycle notifications and the per-guest event bridge.
//!
//! The content host emits lifecycle transitions for each guest through an
//! [`EventBridge`]. Consumers subscribe to one guest id at a time and receive
//! that guest's notifications, in emission order, on their own channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::id::GuestId;

/// Lifecycle transition reported by the content host for one guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestEventKind {
    Attaching,
    Attached,
    Detaching,
    Detached,
    Destroying,
    Destroyed,
}

impl GuestEventKind {
    /// `true` for the notifications announcing the guest is going away.
    pub fn is_destruction(self) -> bool {
        matches!(self, Self::Destroying | Self::Destroyed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestEvent {
    pub guest: GuestId,
    pub kind: GuestEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live registration for one guest's notifications.
///
/// Dropping the subscription closes its channel; the bridge prunes it on the
/// next emit for that guest.
#[derive(Debug)]
pub struct Subscription {
    pub guest: GuestId,
    pub id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<GuestEvent>,
}

impl Subscription {
    /// Wait for the next notification. `None` once the bridge dropped this
    /// subscription (after `unsubscribe` or `clear`).
    pub async fn recv(&mut self) -> Option<GuestEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<GuestEvent> {
        self.receiver.try_recv().ok()
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::UnboundedSender<GuestEvent>,
}

/// Routes host lifecycle notifications to subscribers scoped by guest id.
///
/// Owned by whoever wires the host to the display; there is no global
/// registry.
pub struct EventBridge {
    subscribers: Mutex<HashMap<GuestId, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl EventBridge {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, guest: GuestId) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(guest).or_default().push(Subscriber { id, sender });
        }
        debug!(%guest, ?id, "subscribed to guest events");
        Subscription {
            guest,
            id,
            receiver,
        }
    }

    /// Remove a subscription. Returns `false` if it was already gone, so
    /// repeated calls are harmless.
    pub fn unsubscribe(&self, guest: GuestId, id: SubscriptionId) -> bool {
        let Ok(mut subs) = self.subscribers.lock() else {
            return false;
        };
        let Some(list) = subs.get_mut(&guest) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subs.remove(&guest);
        }
        if removed {
            debug!(%guest, ?id, "unsubscribed from guest events");
        }
        removed
    }

    /// Deliver a notification to every subscriber of `guest`.
    /// Returns how many subscribers received it.
    pub fn emit(&self, guest: GuestId, kind: GuestEventKind) -> usize {
        let Ok(mut subs) = self.subscribers.lock() else {
            return 0;
        };
        let Some(list) = subs.get_mut(&guest) else {
            return 0;
        };
        let event = GuestEvent { guest, kind };
        list.retain(|s| s.sender.send(event).is_ok());
        let delivered = list.len();
        if list.is_empty() {
            subs.remove(&guest);
        }
        delivered
    }

    pub fn subscriber_count(&self, guest: GuestId) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.get(&guest).map_or(0, |l| l.len()))
            .unwrap_or(0)
    }

    /// Drop every subscription for every guest.
    pub fn clear(&self) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.clear();
        }
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}
