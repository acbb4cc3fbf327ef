use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guestview_common::{DisplayError, EventBridge, GuestId, SurfaceId};
use tokio::task::LocalSet;
use tokio::time::sleep;

use super::*;
use crate::host::{ContentHost, SessionHandle};
use crate::memory::{MemoryContainer, MemoryHost, MemorySurface, StyleChange};
use crate::surface::{SurfaceInput, SurfaceState};

const G1: GuestId = GuestId(1);
const G2: GuestId = GuestId(2);
const G3: GuestId = GuestId(3);

struct Harness {
    display: GuestDisplay,
    host: Rc<MemoryHost>,
    container: Rc<MemoryContainer>,
    focus_calls: Rc<Cell<u32>>,
    zoom_changes: Rc<RefCell<Vec<u32>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with(DisplayOptions::default(), MemoryContainer::new())
    }

    fn with(options: DisplayOptions, container: MemoryContainer) -> Self {
        let bridge = Arc::new(EventBridge::new());
        let host = Rc::new(MemoryHost::new(Arc::clone(&bridge)));
        Self::wrapping(options, container, bridge, Rc::clone(&host), host)
    }

    /// Harness whose host takes `delay` to unbind a surface.
    fn with_slow_unbind(delay: Duration) -> Self {
        let bridge = Arc::new(EventBridge::new());
        let host = Rc::new(MemoryHost::new(Arc::clone(&bridge)));
        let slow = Rc::new(SlowUnbindHost {
            host: Rc::clone(&host),
            delay,
        });
        Self::wrapping(
            DisplayOptions::default(),
            MemoryContainer::new(),
            bridge,
            host,
            slow,
        )
    }

    /// The display talks to `content`; `host` is the memory host behind it.
    fn wrapping(
        options: DisplayOptions,
        container: MemoryContainer,
        bridge: Arc<EventBridge>,
        host: Rc<MemoryHost>,
        content: Rc<dyn ContentHost>,
    ) -> Self {
        let container = Rc::new(container);
        let focus_calls = Rc::new(Cell::new(0));
        let zoom_changes = Rc::new(RefCell::new(Vec::new()));

        let focus_sink = Rc::clone(&focus_calls);
        let zoom_sink = Rc::clone(&zoom_changes);
        let display = GuestDisplay::builder(options)
            .container(container.clone())
            .host(content)
            .bridge(bridge)
            .on_focus(move || focus_sink.set(focus_sink.get() + 1))
            .on_zoom_change(move |p| zoom_sink.borrow_mut().push(p))
            .build()
            .expect("display builds");

        Self {
            display,
            host,
            container,
            focus_calls,
            zoom_changes,
        }
    }

    fn surface(&self, id: SurfaceId) -> Rc<MemorySurface> {
        self.container.surface(id).expect("surface exists")
    }

    fn shown(&self) -> Rc<MemorySurface> {
        let handle = self.display.active_surface().expect("a surface is shown");
        self.surface(handle.id())
    }

    /// Show `guest` with the host confirming immediately, and wait it out.
    async fn show_confirmed(&self, guest: GuestId) {
        self.host.set_auto_confirm(true);
        self.display.request_show(guest).unwrap();
        settle().await;
        self.host.set_auto_confirm(false);
    }

    fn in_flight_surface(&self) -> SurfaceId {
        match self.display.phase() {
            Phase::Attaching { surface, .. } => surface,
            other => panic!("expected an attach in progress, got {other:?}"),
        }
    }
}

/// Memory host whose unbind takes a while, like a real host tearing down
/// a guest's view.
struct SlowUnbindHost {
    host: Rc<MemoryHost>,
    delay: Duration,
}

#[async_trait(?Send)]
impl ContentHost for SlowUnbindHost {
    async fn session(&self, guest: GuestId) -> Option<SessionHandle> {
        self.host.session(guest).await
    }

    fn is_destroyed(&self, session: &SessionHandle) -> bool {
        self.host.is_destroyed(session)
    }

    fn bind_session(&self, surface: SurfaceId, session: &SessionHandle) {
        self.host.bind_session(surface, session);
    }

    async fn unbind_session(&self, surface: SurfaceId) {
        sleep(self.delay).await;
        self.host.unbind_session(surface).await;
    }
}

/// Long enough for any confirmed attach to finish.
async fn settle() {
    sleep(Duration::from_millis(200)).await;
}

/// Let spawned work reach its next suspension point.
async fn tick() {
    sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn first_show_attaches_after_confirmation() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            assert_eq!(h.display.snapshot().free, 2);
            h.host.open(G1);

            h.display.request_show(G1).unwrap();
            tick().await;
            let surface = h.in_flight_surface();
            assert_eq!(h.display.snapshot().count(SurfaceState::Attaching), 1);
            assert_eq!(h.display.snapshot().free, 1);
            assert_eq!(h.host.bound_guest(surface), Some(G1));
            assert!(h.display.active_guest().is_none());

            assert_eq!(h.host.confirm(G1), 1);
            settle().await;

            let snapshot = h.display.snapshot();
            assert_eq!(
                snapshot.phase,
                Phase::Attached {
                    guest: G1,
                    surface
                }
            );
            assert_eq!(snapshot.free, 1);
            assert_eq!(snapshot.created, 2);
            let shown = h.shown();
            assert!(shown.has_class("guest-surface--attached"));
            assert!(!shown.has_class("guest-surface--attaching"));
            assert!(shown.ever_had_class("guest-surface--attaching"));
            assert_eq!(
                shown.style_log(),
                vec![StyleChange::Hidden(true), StyleChange::Hidden(false)]
            );
            assert_eq!(h.host.surfaces_for(G1), vec![surface]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn fallback_timer_reveals_without_notification() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.display.request_show(G1).unwrap();

            sleep(Duration::from_millis(1900)).await;
            assert!(h.display.active_guest().is_none());

            sleep(Duration::from_millis(600)).await;
            assert_eq!(h.display.active_guest(), Some(G1));
            assert!(!h.shown().is_hidden());
            assert!(h.shown().has_class("guest-surface--attached"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn repeated_requests_do_not_restart() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);

            h.display.request_show(G1).unwrap();
            h.display.request_show(G1).unwrap();
            tick().await;
            h.display.request_show(G1).unwrap();
            h.host.confirm(G1);
            settle().await;
            h.display.request_show(G1).unwrap();
            settle().await;

            assert_eq!(h.host.bind_log().len(), 1);
            assert_eq!(h.display.snapshot().created, 2);
            assert_eq!(h.display.active_guest(), Some(G1));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn swap_recycles_previous_surface() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);

            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();
            h.show_confirmed(G2).await;
            let second = h.display.active_surface().unwrap().id();

            assert_ne!(first, second);
            assert_eq!(h.display.active_guest(), Some(G2));
            assert_eq!(h.host.bound_guest(first), None);
            assert!(!h.surface(first).has_class("guest-surface--attached"));

            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.free, 1);
            assert_eq!(snapshot.created, 2);
            assert_eq!(snapshot.count(SurfaceState::Attached), 1);
            assert_eq!(snapshot.count(SurfaceState::Free), 1);

            // Going back reuses the first surface, which has painted before
            h.show_confirmed(G1).await;
            assert_eq!(h.display.active_surface().unwrap().id(), first);
            let log = h.surface(first).style_log();
            assert_eq!(
                &log[log.len() - 2..],
                &[StyleChange::TopOffset(1), StyleChange::TopOffset(0)]
            );
            assert_eq!(h.display.snapshot().created, 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn old_surface_stays_shown_until_new_one_is_revealed() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();

            h.display.request_show(G2).unwrap();
            tick().await;
            assert!(h.surface(first).has_class("guest-surface--attached"));
            assert_eq!(h.display.snapshot().free, 0);

            h.host.confirm(G2);
            settle().await;
            assert!(!h.surface(first).has_class("guest-surface--attached"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn latest_request_wins_while_attaching() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            for guest in [G1, G2, G3] {
                h.host.open(guest);
            }

            h.display.request_show(G1).unwrap();
            tick().await;
            let surface = h.in_flight_surface();
            h.display.request_show(G2).unwrap();
            h.display.request_show(G3).unwrap();

            h.host.set_auto_confirm(true);
            h.host.confirm(G1);
            settle().await;

            assert_eq!(h.display.active_guest(), Some(G3));
            assert_eq!(h.display.active_surface().unwrap().id(), surface);
            let bound: Vec<_> = h.host.bind_log().into_iter().map(|(_, g)| g).collect();
            assert_eq!(bound, vec![G1, G3]);
            assert!(h.host.surfaces_for(G1).is_empty());

            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.count(SurfaceState::Attached), 1);
            assert_eq!(snapshot.free, 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn request_back_to_shown_guest_discards_new_surface() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();

            h.display.request_show(G2).unwrap();
            tick().await;
            let second = h.in_flight_surface();
            h.display.request_show(G1).unwrap();
            h.host.confirm(G2);
            settle().await;

            assert_eq!(
                h.display.phase(),
                Phase::Attached {
                    guest: G1,
                    surface: first
                }
            );
            assert!(h.host.surfaces_for(G2).is_empty());
            assert!(!h.surface(second).ever_had_class("guest-surface--attached"));
            assert!(h.surface(first).has_class("guest-surface--attached"));
            assert_eq!(h.display.snapshot().free, 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn stale_target_during_reveal_frames_redirects() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            for guest in [G1, G2, G3] {
                h.host.open(guest);
            }
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();

            h.display.request_show(G2).unwrap();
            tick().await;
            let second = h.in_flight_surface();
            h.host.set_auto_confirm(true);
            h.host.confirm(G2);

            // Painted, now stacked above the shown surface
            sleep(Duration::from_millis(60)).await;
            assert!(h.surface(second).has_class("guest-surface--attaching"));
            assert!(!h.surface(second).has_class("guest-surface--attached"));

            h.display.request_show(G3).unwrap();
            settle().await;

            assert_eq!(
                h.display.phase(),
                Phase::Attached {
                    guest: G3,
                    surface: second
                }
            );
            assert!(h.host.surfaces_for(G2).is_empty());
            assert_eq!(h.host.bound_guest(first), None);
            let bound: Vec<_> = h.host.bind_log().into_iter().map(|(_, g)| g).collect();
            assert_eq!(bound, vec![G1, G2, G3]);

            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.free, 1);
            assert_eq!(snapshot.count(SurfaceState::Attached), 1);
            assert_eq!(snapshot.count(SurfaceState::Attaching), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn request_back_during_reveal_frames_discards_surface() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();

            h.display.request_show(G2).unwrap();
            tick().await;
            let second = h.in_flight_surface();
            h.host.confirm(G2);
            sleep(Duration::from_millis(60)).await;
            assert!(h.surface(second).has_class("guest-surface--attaching"));

            h.display.request_show(G1).unwrap();
            settle().await;

            assert_eq!(
                h.display.phase(),
                Phase::Attached {
                    guest: G1,
                    surface: first
                }
            );
            let discarded = h.surface(second);
            assert!(!discarded.ever_had_class("guest-surface--attached"));
            assert!(!discarded.has_class("guest-surface--attaching"));
            assert!(h.surface(first).has_class("guest-surface--attached"));
            assert!(h.host.surfaces_for(G2).is_empty());

            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.free, 1);
            assert_eq!(snapshot.count(SurfaceState::Attaching), 0);
            assert_eq!(snapshot.count(SurfaceState::Attached), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn request_during_previous_unbind_restarts() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::with_slow_unbind(Duration::from_millis(100));
            for guest in [G1, G2, G3] {
                h.host.open(guest);
            }
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();

            h.display.request_show(G2).unwrap();
            tick().await;
            let second = h.in_flight_surface();
            h.host.set_auto_confirm(true);
            h.host.confirm(G2);

            // G2 is revealed, the old surface is still being unbound
            sleep(Duration::from_millis(110)).await;
            assert_eq!(
                h.display.phase(),
                Phase::Attaching {
                    target: G2,
                    binding: G2,
                    surface: second,
                    previous: Some(first)
                }
            );
            assert!(h.surface(second).has_class("guest-surface--attached"));

            h.display.request_show(G3).unwrap();
            sleep(Duration::from_millis(600)).await;

            assert_eq!(
                h.display.phase(),
                Phase::Attached {
                    guest: G3,
                    surface: first
                }
            );
            assert_eq!(h.host.binding_count(), 1);
            assert!(h.host.surfaces_for(G2).is_empty());

            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.free, 1);
            assert_eq!(snapshot.created, 2);
            assert_eq!(snapshot.count(SurfaceState::Attached), 1);
            assert_eq!(snapshot.count(SurfaceState::Attaching), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn fallback_reveal_repaints_reused_surface_fully() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            let first = h.display.active_surface().unwrap().id();
            h.show_confirmed(G2).await;

            h.display.request_show(G1).unwrap();
            sleep(Duration::from_millis(2500)).await;

            assert_eq!(h.display.active_guest(), Some(G1));
            assert_eq!(h.display.active_surface().unwrap().id(), first);
            assert_eq!(
                h.surface(first).style_log(),
                vec![
                    StyleChange::Hidden(true),
                    StyleChange::Hidden(false),
                    StyleChange::Hidden(true),
                    StyleChange::Hidden(false),
                ]
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn destroyed_guest_returns_surface_to_pool() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;

            h.display.request_show(G2).unwrap();
            tick().await;
            let second = h.in_flight_surface();
            h.host.destroy(G2);
            settle().await;

            assert_eq!(h.display.active_guest(), Some(G1));
            assert!(matches!(h.display.phase(), Phase::Attached { guest, .. } if guest == G1));
            let snapshot = h.display.snapshot();
            assert_eq!(snapshot.free, 1);
            let released = snapshot.surfaces.iter().find(|s| s.id == second).unwrap();
            assert_eq!(released.state, SurfaceState::Free);
            assert_eq!(released.guest, None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn unknown_guest_is_ignored() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.display.request_show(GuestId(9)).unwrap();
            settle().await;

            assert_eq!(h.display.phase(), Phase::Idle);
            assert_eq!(h.display.snapshot().free, 2);
            assert!(h.host.bind_log().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn destroyed_guest_redirects_to_newer_request() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);

            h.display.request_show(G1).unwrap();
            tick().await;
            h.display.request_show(G2).unwrap();
            h.host.set_auto_confirm(true);
            h.host.destroy(G1);
            settle().await;

            assert_eq!(h.display.active_guest(), Some(G2));
            assert_eq!(h.display.snapshot().free, 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn focus_waits_for_attach_to_settle() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);

            h.display.request_show(G1).unwrap();
            tick().await;
            h.display.focus_active();
            assert!(h.display.snapshot().focus_pending);

            h.host.confirm(G1);
            settle().await;
            assert!(!h.display.snapshot().focus_pending);
            assert_eq!(h.shown().focus_count(), 1);

            h.display.focus_active();
            assert_eq!(h.shown().focus_count(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn teardown_removes_every_surface() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            h.display.request_show(G2).unwrap();
            tick().await;

            h.display.teardown().await;
            settle().await;

            assert!(h.display.is_disposed());
            assert_eq!(h.display.phase(), Phase::Idle);
            assert_eq!(h.host.binding_count(), 0);
            assert!(h.container.surfaces().iter().all(|s| s.is_removed()));
            assert!(h.display.snapshot().surfaces.is_empty());
            assert!(matches!(
                h.display.request_show(G1),
                Err(DisplayError::Disposed)
            ));
            h.display.focus_active();
        })
        .await;
}

#[test]
fn build_requires_container() {
    let bridge = Arc::new(EventBridge::new());
    let result = GuestDisplay::builder(DisplayOptions::default())
        .host(Rc::new(MemoryHost::new(Arc::clone(&bridge))))
        .bridge(bridge)
        .build();
    assert!(matches!(result, Err(DisplayError::MissingContainer)));
}

#[test]
fn build_requires_host() {
    let result = GuestDisplay::builder(DisplayOptions::default())
        .container(Rc::new(MemoryContainer::new()))
        .bridge(Arc::new(EventBridge::new()))
        .build();
    assert!(matches!(
        result,
        Err(DisplayError::MissingCollaborator("content host"))
    ));
}

#[test]
fn build_fails_when_pool_cannot_fill() {
    let bridge = Arc::new(EventBridge::new());
    let result = GuestDisplay::builder(DisplayOptions::default())
        .container(Rc::new(MemoryContainer::with_capacity(1)))
        .host(Rc::new(MemoryHost::new(Arc::clone(&bridge))))
        .bridge(bridge)
        .build();
    assert!(matches!(result, Err(DisplayError::SurfaceCreation(_))));
}

#[tokio::test(start_paused = true)]
async fn surface_creation_failure_leaves_state_unchanged() {
    LocalSet::new()
        .run_until(async {
            let options = DisplayOptions {
                attached_pool_size: 3,
                ..DisplayOptions::default()
            };
            let h = Harness::with(options, MemoryContainer::with_capacity(2));
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;

            let result = h.display.request_show(G2);
            assert!(matches!(result, Err(DisplayError::SurfaceCreation(_))));
            assert_eq!(h.display.active_guest(), Some(G1));
            assert!(matches!(h.display.phase(), Phase::Attached { .. }));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn surface_input_reaches_callbacks() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            h.show_confirmed(G2).await;
            h.show_confirmed(G1).await;

            let shown = h.shown();
            shown.dispatch(SurfaceInput::Focus);
            assert_eq!(h.focus_calls.get(), 1);

            shown.dispatch(SurfaceInput::Wheel {
                delta_y: 120.0,
                ctrl: true,
            });
            shown.dispatch(SurfaceInput::Wheel {
                delta_y: 120.0,
                ctrl: true,
            });
            shown.dispatch(SurfaceInput::Diagnostic("console: hello".into()));
            sleep(Duration::from_millis(50)).await;
            assert_eq!(*h.zoom_changes.borrow(), vec![110]);

            for surface in h.container.surfaces() {
                assert_eq!(surface.listener_installs(), 1);
            }
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn navigation_focuses_unless_blank_or_switching() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.host.open(G2);
            h.show_confirmed(G1).await;
            let shown = h.shown();

            shown.dispatch(SurfaceInput::Navigated {
                url: "https://example.com/".into(),
            });
            assert_eq!(shown.focus_count(), 1);

            shown.dispatch(SurfaceInput::Navigated {
                url: "about:newtab?source=tab".into(),
            });
            assert_eq!(shown.focus_count(), 1);

            h.display.request_show(G2).unwrap();
            tick().await;
            shown.dispatch(SurfaceInput::Navigated {
                url: "https://example.com/next".into(),
            });
            assert_eq!(shown.focus_count(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn tab_detached_unbinds_surface() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.show_confirmed(G1).await;
            let handle = h.display.active_surface().unwrap();

            h.surface(handle.id()).dispatch(SurfaceInput::TabDetachedAt);
            tick().await;

            assert_eq!(h.host.bound_guest(handle.id()), None);
            assert_eq!(handle.guest(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn tab_detached_keeps_guest_rebound_meanwhile() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.host.open(G1);
            h.show_confirmed(G1).await;
            let handle = h.display.active_surface().unwrap();

            h.surface(handle.id()).dispatch(SurfaceInput::TabDetachedAt);
            handle.set_guest(Some(G2));
            tick().await;

            assert_eq!(h.host.bound_guest(handle.id()), None);
            assert_eq!(handle.guest(), Some(G2));
        })
        .await;
}

/// Tiny deterministic generator so request interleavings are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

#[tokio::test(start_paused = true)]
async fn interleaved_requests_keep_invariants() {
    LocalSet::new()
        .run_until(async {
            for seed in [1u64, 7, 42, 1234] {
                let mut rng = Lcg(seed);
                let h = Harness::new();
                let guests: Vec<_> = (1..=4).map(GuestId).collect();
                for guest in &guests {
                    h.host.open(*guest);
                }

                let mut last = None;
                for _ in 0..40 {
                    let guest = guests[rng.next(4) as usize];
                    h.display.request_show(guest).unwrap();
                    last = Some(guest);

                    sleep(Duration::from_millis(rng.next(120))).await;
                    if rng.next(3) == 0 {
                        if let Phase::Attaching { binding, .. } = h.display.phase() {
                            h.host.confirm(binding);
                        }
                    }

                    let snapshot = h.display.snapshot();
                    let attaching = snapshot.count(SurfaceState::Attaching);
                    let attached = snapshot.count(SurfaceState::Attached);
                    assert!(attaching <= 1, "seed {seed}: {snapshot:?}");
                    assert!(attached <= 1, "seed {seed}: {snapshot:?}");
                    assert_eq!(snapshot.free + attaching + attached, 2, "seed {seed}");
                    assert_eq!(snapshot.created, 2, "seed {seed}");
                    for guest in &guests {
                        assert!(h.host.surfaces_for(*guest).len() <= 1, "seed {seed}");
                    }
                }

                h.host.set_auto_confirm(true);
                sleep(Duration::from_secs(5)).await;
                assert_eq!(h.display.active_guest(), last, "seed {seed}");
                assert_eq!(h.display.snapshot().free, 1, "seed {seed}");
            }
        })
        .await;
}
