//! The content host: owner of guest sessions.

use async_trait::async_trait;
use guestview_common::{GuestId, SurfaceId};

/// Live handle to a guest's session, as returned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    pub guest: GuestId,
    /// Host-side instance id used when binding to a surface.
    pub instance_id: u64,
}

/// Operations the display needs from the embedding content host.
///
/// Lifecycle notifications (`attached`, `destroyed`, ...) are not part of
/// this trait; the host publishes them through an
/// [`EventBridge`](guestview_common::EventBridge).
#[async_trait(?Send)]
pub trait ContentHost {
    /// Look up the live session for a guest. `None` if the host has no
    /// such guest.
    async fn session(&self, guest: GuestId) -> Option<SessionHandle>;

    fn is_destroyed(&self, session: &SessionHandle) -> bool;

    /// Start binding `session` to `surface`. Completion is reported only by
    /// an `attached` notification, which may never arrive.
    fn bind_session(&self, surface: SurfaceId, session: &SessionHandle);

    /// Detach whatever guest is bound to `surface`.
    async fn unbind_session(&self, surface: SurfaceId);
}
