//! The attach sequence.
//!
//! One sequence runs at a time. It binds its guest to its surface, waits for
//! the host's `attached` notification (or the fallback timer), forces a
//! paint, and reveals the surface. After every suspension it re-reads the
//! in-flight target: if the user asked for something else meanwhile, the
//! surface is unbound and either pointed at the new target or handed back
//! to the pool.

use std::rc::Rc;
use std::sync::Arc;

use guestview_common::{
    new_correlation_id, EventBridge, GuestEvent, GuestEventKind, GuestId, Subscription,
};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::state::{Active, InFlight};
use super::Inner;
use crate::frame::frames;
use crate::surface::{SurfaceHandle, SurfaceState};
use crate::transition;

/// What the sequence does after one pass.
enum Next {
    Done,
    Restart {
        guest: GuestId,
        handle: Rc<SurfaceHandle>,
        previous: Option<Rc<SurfaceHandle>>,
    },
}

enum Confirmation {
    Notified,
    TimedOut,
    Destroyed,
}

/// Subscription to one guest's notifications, dropped from the bridge when
/// released or when the guard goes out of scope.
struct GuestEvents {
    bridge: Arc<EventBridge>,
    subscription: Subscription,
}

impl GuestEvents {
    fn subscribe(bridge: Arc<EventBridge>, guest: GuestId) -> Self {
        let subscription = bridge.subscribe(guest);
        Self {
            bridge,
            subscription,
        }
    }

    async fn recv(&mut self) -> Option<GuestEvent> {
        self.subscription.recv().await
    }

    fn release(&self) {
        self.bridge
            .unsubscribe(self.subscription.guest, self.subscription.id);
    }
}

impl Drop for GuestEvents {
    fn drop(&mut self) {
        self.release();
    }
}

pub(super) async fn run(
    inner: Rc<Inner>,
    mut guest: GuestId,
    mut handle: Rc<SurfaceHandle>,
    mut previous: Option<Rc<SurfaceHandle>>,
) {
    loop {
        let span = info_span!(
            "attach",
            %guest,
            surface = %handle.id(),
            cid = %new_correlation_id()
        );
        match attach_once(&inner, guest, handle, previous)
            .instrument(span)
            .await
        {
            Next::Done => return,
            Next::Restart {
                guest: next_guest,
                handle: next_handle,
                previous: next_previous,
            } => {
                guest = next_guest;
                handle = next_handle;
                previous = next_previous;
            }
        }
    }
}

async fn attach_once(
    inner: &Rc<Inner>,
    guest: GuestId,
    handle: Rc<SurfaceHandle>,
    previous: Option<Rc<SurfaceHandle>>,
) -> Next {
    let started = Instant::now();
    {
        let mut slots = inner.slots.borrow_mut();
        if slots.disposed {
            return Next::Done;
        }
        match slots.in_flight.as_mut() {
            Some(flight) => {
                flight.binding = guest;
                flight.handle = Rc::clone(&handle);
                flight.previous = previous.clone();
            }
            None => {
                slots.in_flight = Some(InFlight {
                    target: guest,
                    binding: guest,
                    handle: Rc::clone(&handle),
                    previous: previous.clone(),
                });
            }
        }
    }
    handle.set_state(SurfaceState::Attaching);
    debug!("starting attach");

    let mut events = GuestEvents::subscribe(Arc::clone(&inner.bridge), guest);

    let session = inner.host.session(guest).await;
    if is_disposed(inner) {
        return Next::Done;
    }
    let session = match session {
        Some(session) if !inner.host.is_destroyed(&session) => session,
        _ => {
            debug!("guest gone before attach");
            events.release();
            return abandon(inner, guest, handle, previous).await;
        }
    };

    if let Some(stale) = handle.guest() {
        warn!(%stale, "surface still bound, detaching first");
        inner.host.unbind_session(handle.id()).await;
        handle.set_guest(None);
        if is_disposed(inner) {
            return Next::Done;
        }
    }
    debug!(instance = session.instance_id, "binding guest to surface");
    handle.set_guest(Some(guest));
    inner.host.bind_session(handle.id(), &session);

    let confirmation = wait_for_attach(inner, &mut events).await;
    match confirmation {
        Confirmation::Destroyed => {
            debug!("guest destroyed instead of attached");
            events.release();
            return abandon(inner, guest, handle, previous).await;
        }
        Confirmation::Notified => {
            debug!(elapsed_ms = elapsed_ms(started), "guest did attach");
        }
        Confirmation::TimedOut => {
            debug!(
                elapsed_ms = elapsed_ms(started),
                "no attach notification, forcing paint anyway"
            );
        }
    }
    if is_disposed(inner) {
        return Next::Done;
    }

    if matches!(confirmation, Confirmation::TimedOut) {
        transition::force_full_paint(&handle, inner.clock.as_ref()).await;
    } else {
        transition::force_paint(&handle, inner.clock.as_ref()).await;
    }
    if is_disposed(inner) {
        return Next::Done;
    }
    if let Some(next) = redirect_if_stale(inner, guest, &handle, &previous, &events).await {
        return next;
    }

    let options = &inner.options;
    let surface = Rc::clone(handle.surface());

    // Stack above the shown surface for a few frames before promoting, so
    // the old one stays visible until the new one has painted
    surface.add_class(&options.class_attaching);
    frames(inner.clock.as_ref(), options.reveal_frames).await;
    if is_disposed(inner) {
        return Next::Done;
    }
    if is_stale(inner, guest) {
        surface.remove_class(&options.class_attaching);
        if let Some(next) = redirect_if_stale(inner, guest, &handle, &previous, &events).await {
            return next;
        }
    }

    events.release();
    surface.add_class(&options.class_attached);
    if let Some(prev) = &previous {
        prev.surface().remove_class(&options.class_attached);
    }
    surface.remove_class(&options.class_attaching);
    info!(elapsed_ms = elapsed_ms(started), "guest shown");

    if let Some(prev) = previous {
        debug!(previous = %prev.id(), "detaching guest from previous surface");
        inner.host.unbind_session(prev.id()).await;
        prev.set_guest(None);
        if is_disposed(inner) {
            return Next::Done;
        }
        inner.pool.borrow_mut().release(prev);
    }

    finalize(inner, guest, handle)
}

async fn wait_for_attach(inner: &Inner, events: &mut GuestEvents) -> Confirmation {
    let fallback = tokio::time::sleep(inner.options.fallback_delay);
    tokio::pin!(fallback);

    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event.map(|e| e.kind) {
                Some(GuestEventKind::Attached) => return Confirmation::Notified,
                Some(kind) if kind.is_destruction() => return Confirmation::Destroyed,
                Some(GuestEventKind::Detached) => {
                    warn!("guest detached whilst waiting for attach");
                }
                Some(kind) => debug!(?kind, "guest event while attaching"),
                None => return Confirmation::Destroyed,
            },
            () = &mut fallback => return Confirmation::TimedOut,
        }
    }
}

/// The desired guest moved on since this pass started.
fn is_stale(inner: &Inner, guest: GuestId) -> bool {
    inner.slots.borrow().target() != Some(guest)
}

fn is_disposed(inner: &Inner) -> bool {
    inner.slots.borrow().disposed
}

/// If the target changed, unbind the guest from this surface and work out
/// where the surface goes next. `None` means carry on.
async fn redirect_if_stale(
    inner: &Rc<Inner>,
    guest: GuestId,
    handle: &Rc<SurfaceHandle>,
    previous: &Option<Rc<SurfaceHandle>>,
    events: &GuestEvents,
) -> Option<Next> {
    let target = inner.slots.borrow().target();
    match target {
        None => return Some(Next::Done),
        Some(target) if target == guest => return None,
        Some(target) => debug!(%target, "guest no longer wanted, detaching it from surface"),
    }
    events.release();
    inner.host.unbind_session(handle.id()).await;
    handle.set_guest(None);
    Some(redirect(inner, Rc::clone(handle), previous.clone()))
}

/// Point an unbound surface at the current target, or give it back to the
/// pool when the target is the guest already shown.
fn redirect(
    inner: &Rc<Inner>,
    handle: Rc<SurfaceHandle>,
    previous: Option<Rc<SurfaceHandle>>,
) -> Next {
    let (target, active) = {
        let slots = inner.slots.borrow();
        if slots.disposed {
            return Next::Done;
        }
        (slots.target(), slots.active_guest())
    };
    let Some(target) = target.filter(|t| Some(*t) != active) else {
        info!("asked to show the guest already shown, returning surface to pool");
        settle(inner, handle);
        return Next::Done;
    };
    debug!(%target, "continuing with newer guest");
    Next::Restart {
        guest: target,
        handle,
        previous,
    }
}

/// The attach could not complete because its guest is gone.
async fn abandon(
    inner: &Rc<Inner>,
    guest: GuestId,
    handle: Rc<SurfaceHandle>,
    previous: Option<Rc<SurfaceHandle>>,
) -> Next {
    if handle.guest().is_some() {
        inner.host.unbind_session(handle.id()).await;
        handle.set_guest(None);
    }
    if is_disposed(inner) {
        return Next::Done;
    }
    if is_stale(inner, guest) {
        return redirect(inner, handle, previous);
    }
    settle(inner, handle);
    Next::Done
}

/// End the in-flight sequence without changing what is shown.
fn settle(inner: &Inner, handle: Rc<SurfaceHandle>) {
    let (focus, active) = {
        let mut slots = inner.slots.borrow_mut();
        slots.in_flight = None;
        let focus = std::mem::take(&mut slots.focus_pending);
        (focus, slots.attached.as_ref().map(|a| Rc::clone(&a.handle)))
    };
    inner.pool.borrow_mut().release(handle);
    if let (true, Some(active)) = (focus, active) {
        active.surface().focus();
    }
}

/// Record the newly shown guest, then either start on a request that came
/// in meanwhile or apply a pending focus.
fn finalize(inner: &Rc<Inner>, guest: GuestId, handle: Rc<SurfaceHandle>) -> Next {
    let (pending, focus) = {
        let mut slots = inner.slots.borrow_mut();
        if slots.disposed {
            return Next::Done;
        }
        let pending = slots.in_flight.take().map_or(guest, |f| f.target);
        slots.attached = Some(Active {
            guest,
            handle: Rc::clone(&handle),
        });
        let focus = pending == guest && std::mem::take(&mut slots.focus_pending);
        (pending, focus)
    };
    handle.set_state(SurfaceState::Attached);

    if pending != guest {
        debug!(%pending, "another guest was requested during attach");
        let acquired = inner.pool.borrow_mut().acquire(true);
        let next = match acquired {
            Ok(next) => {
                next.set_state(SurfaceState::Attaching);
                next
            }
            Err(e) => {
                error!(%pending, error = %e, "no surface available for queued guest");
                return Next::Done;
            }
        };
        inner.slots.borrow_mut().in_flight = Some(InFlight {
            target: pending,
            binding: pending,
            handle: Rc::clone(&next),
            previous: Some(Rc::clone(&handle)),
        });
        return Next::Restart {
            guest: pending,
            handle: next,
            previous: Some(handle),
        };
    }

    if focus {
        handle.surface().focus();
    }
    Next::Done
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
