//! Attach orchestration.
//!
//! `GuestDisplay` decides which pooled surface shows which guest. A show
//! request binds the guest to a free surface, waits for the host to confirm,
//! forces a paint, reveals the surface above the old one, and only then
//! retires the old surface to the pool. Requests that arrive mid-sequence
//! only move the target; the running sequence notices at its next
//! resumption point and redirects or discards its surface.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use guestview_common::{DisplayError, EventBridge, GuestId};
use tracing::{debug, info, warn};

use crate::frame::{FrameClock, TokioFrameClock};
use crate::host::ContentHost;
use crate::options::DisplayOptions;
use crate::pool::SurfacePool;
use crate::surface::{SurfaceContainer, SurfaceHandle, SurfaceState};

mod attach;
mod input;
mod state;
#[cfg(test)]
mod tests;

pub use state::{DisplaySnapshot, Phase, SurfaceSnapshot};

use state::{InFlight, Slots};

pub(crate) struct Inner {
    pub options: DisplayOptions,
    pub host: Rc<dyn ContentHost>,
    pub bridge: Arc<EventBridge>,
    pub clock: Rc<dyn FrameClock>,
    pub on_focus: Rc<dyn Fn()>,
    pub on_zoom_change: Rc<dyn Fn(u32)>,
    pub pool: RefCell<SurfacePool>,
    pub slots: RefCell<Slots>,
}

/// Shows one guest at a time using pooled surfaces.
pub struct GuestDisplay {
    inner: Rc<Inner>,
}

/// Collects the collaborators a [`GuestDisplay`] needs.
pub struct GuestDisplayBuilder {
    options: DisplayOptions,
    container: Option<Rc<dyn SurfaceContainer>>,
    host: Option<Rc<dyn ContentHost>>,
    bridge: Option<Arc<EventBridge>>,
    clock: Option<Rc<dyn FrameClock>>,
    on_focus: Option<Rc<dyn Fn()>>,
    on_zoom_change: Option<Rc<dyn Fn(u32)>>,
}

impl GuestDisplayBuilder {
    /// Mount point for surfaces. Required.
    pub fn container(mut self, container: Rc<dyn SurfaceContainer>) -> Self {
        self.container = Some(container);
        self
    }

    /// Content host owning the guests. Required.
    pub fn host(mut self, host: Rc<dyn ContentHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Bridge the host publishes lifecycle notifications on. Required.
    pub fn bridge(mut self, bridge: Arc<EventBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Frame clock; defaults to the tokio timer at `options.frame_interval`.
    pub fn clock(mut self, clock: Rc<dyn FrameClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Called when the user focuses a surface.
    pub fn on_focus(mut self, f: impl Fn() + 'static) -> Self {
        self.on_focus = Some(Rc::new(f));
        self
    }

    /// Called with the new zoom percentage after a ctrl+wheel gesture.
    pub fn on_zoom_change(mut self, f: impl Fn(u32) + 'static) -> Self {
        self.on_zoom_change = Some(Rc::new(f));
        self
    }

    /// Validate collaborators, wire surface listeners, and fill the pool.
    pub fn build(self) -> Result<GuestDisplay, DisplayError> {
        let container = self.container.ok_or(DisplayError::MissingContainer)?;
        let host = self
            .host
            .ok_or(DisplayError::MissingCollaborator("content host"))?;
        let bridge = self
            .bridge
            .ok_or(DisplayError::MissingCollaborator("event bridge"))?;
        let clock: Rc<dyn FrameClock> = match self.clock {
            Some(clock) => clock,
            None => Rc::new(TokioFrameClock::new(self.options.frame_interval)),
        };
        let on_focus: Rc<dyn Fn()> = match self.on_focus {
            Some(f) => f,
            None => Rc::new(|| {}),
        };
        let on_zoom_change: Rc<dyn Fn(u32)> = match self.on_zoom_change {
            Some(f) => f,
            None => Rc::new(|_| {}),
        };

        let pool = SurfacePool::new(
            container,
            self.options.class_base.clone(),
            self.options.idle_pool_size,
            self.options.attached_pool_size,
        );
        let inner = Rc::new(Inner {
            options: self.options,
            host,
            bridge,
            clock,
            on_focus,
            on_zoom_change,
            pool: RefCell::new(pool),
            slots: RefCell::new(Slots::default()),
        });

        input::install(&inner);
        inner.pool.borrow_mut().ensure_size(false)?;

        Ok(GuestDisplay { inner })
    }
}

impl GuestDisplay {
    pub fn builder(options: DisplayOptions) -> GuestDisplayBuilder {
        GuestDisplayBuilder {
            options,
            container: None,
            host: None,
            bridge: None,
            clock: None,
            on_focus: None,
            on_zoom_change: None,
        }
    }

    /// Display `guest`, replacing whatever is shown once it is ready.
    ///
    /// Repeating the current or in-flight guest does nothing. While an
    /// attach is running, only the latest request is kept. Must be called
    /// inside a `LocalSet`.
    pub fn request_show(&self, guest: GuestId) -> Result<(), DisplayError> {
        let previous = {
            let mut slots = self.inner.slots.borrow_mut();
            if slots.disposed {
                warn!(%guest, "show requested after teardown");
                return Err(DisplayError::Disposed);
            }
            if let Some(flight) = slots.in_flight.as_mut() {
                if flight.target == guest {
                    debug!(%guest, "already attaching this guest");
                } else {
                    debug!(%guest, replaced = %flight.target, "attach in progress, queuing replacement");
                    flight.target = guest;
                }
                return Ok(());
            }
            if slots.active_guest() == Some(guest) {
                debug!(%guest, "guest already shown");
                return Ok(());
            }
            slots.attached.as_ref().map(|a| Rc::clone(&a.handle))
        };

        let handle = self.inner.pool.borrow_mut().acquire(previous.is_some())?;
        handle.set_state(SurfaceState::Attaching);
        self.inner.slots.borrow_mut().in_flight = Some(InFlight {
            target: guest,
            binding: guest,
            handle: Rc::clone(&handle),
            previous: previous.clone(),
        });
        tokio::task::spawn_local(attach::run(
            Rc::clone(&self.inner),
            guest,
            handle,
            previous,
        ));
        Ok(())
    }

    /// Focus the shown surface, or once the running attach settles.
    pub fn focus_active(&self) {
        let handle = {
            let mut slots = self.inner.slots.borrow_mut();
            if slots.disposed {
                warn!("focus requested after teardown");
                return;
            }
            if slots.in_flight.is_some() {
                slots.focus_pending = true;
                return;
            }
            slots.attached.as_ref().map(|a| Rc::clone(&a.handle))
        };
        if let Some(handle) = handle {
            handle.surface().focus();
        }
    }

    /// Surface currently displayed, if any.
    pub fn active_surface(&self) -> Option<Rc<SurfaceHandle>> {
        self.inner
            .slots
            .borrow()
            .attached
            .as_ref()
            .map(|a| Rc::clone(&a.handle))
    }

    pub fn active_guest(&self) -> Option<GuestId> {
        self.inner.slots.borrow().active_guest()
    }

    pub fn phase(&self) -> Phase {
        self.inner.slots.borrow().phase()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.slots.borrow().disposed
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let slots = self.inner.slots.borrow();
        let pool = self.inner.pool.borrow();
        DisplaySnapshot {
            phase: slots.phase(),
            active_guest: slots.active_guest(),
            free: pool.free_count(),
            created: pool.created(),
            focus_pending: slots.focus_pending,
            disposed: slots.disposed,
            surfaces: pool
                .surfaces()
                .iter()
                .map(|h| SurfaceSnapshot {
                    id: h.id(),
                    state: h.state(),
                    guest: h.guest(),
                })
                .collect(),
        }
    }

    /// Detach every guest and remove every surface. The display refuses
    /// further requests afterwards.
    pub async fn teardown(&self) {
        {
            let mut slots = self.inner.slots.borrow_mut();
            if slots.disposed {
                return;
            }
            slots.disposed = true;
            slots.focus_pending = false;
            slots.in_flight = None;
            slots.attached = None;
        }

        let handles = self.inner.pool.borrow_mut().drain();
        let mut pending_removal = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(guest) = handle.guest() {
                debug!(surface = %handle.id(), %guest, "detaching guest before removal");
                self.inner.host.unbind_session(handle.id()).await;
                handle.set_guest(None);
            }
            handle.set_state(SurfaceState::PendingRemoval);
            pending_removal.push(handle);
        }

        let removed = pending_removal.len();
        for handle in pending_removal {
            handle.surface().remove();
        }
        info!(removed, "display torn down");
    }
}
