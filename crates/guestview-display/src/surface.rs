//! Display surfaces and the handles the pool tracks them with.

use std::cell::Cell;
use std::rc::Rc;

use guestview_common::{DisplayError, GuestId, SurfaceId};
use serde::{Deserialize, Serialize};

/// Input reported upward by a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceInput {
    /// The user focused the surface.
    Focus,
    /// Mouse wheel over the surface. `ctrl` is set for zoom gestures.
    Wheel { delta_y: f64, ctrl: bool },
    /// The bound guest finished a navigation.
    Navigated { url: String },
    /// The host moved the guest's tab elsewhere.
    TabDetachedAt,
    /// Anything else the surface reports; logged only.
    Diagnostic(String),
}

pub type InputListener = Box<dyn Fn(SurfaceInput)>;

/// One native view capable of showing at most one guest at a time.
pub trait DisplaySurface {
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);

    /// Toggle the surface out of layout entirely.
    fn set_hidden(&self, hidden: bool);

    /// Nudge the surface down by `px` pixels; `0` restores its position.
    fn set_top_offset(&self, px: i32);

    fn focus(&self);
    fn zoom_in(&self);
    fn zoom_out(&self);
    fn zoom_percent(&self) -> u32;

    /// Install the single input listener for this surface's lifetime.
    fn set_input_listener(&self, listener: InputListener);

    /// Unmount from the container.
    fn remove(&self);
}

/// Mount point that creates surfaces.
pub trait SurfaceContainer {
    fn create_surface(
        &self,
        id: SurfaceId,
        base_class: &str,
    ) -> Result<Rc<dyn DisplaySurface>, DisplayError>;
}

/// Lifecycle class of a pooled surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Free,
    Attaching,
    Attached,
    PendingRemoval,
}

/// A surface plus the bookkeeping the pool and orchestrator share.
pub struct SurfaceHandle {
    id: SurfaceId,
    surface: Rc<dyn DisplaySurface>,
    state: Cell<SurfaceState>,
    guest: Cell<Option<GuestId>>,
    painted: Cell<bool>,
}

impl SurfaceHandle {
    pub(crate) fn new(id: SurfaceId, surface: Rc<dyn DisplaySurface>) -> Self {
        Self {
            id,
            surface,
            state: Cell::new(SurfaceState::Free),
            guest: Cell::new(None),
            painted: Cell::new(false),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn surface(&self) -> &Rc<dyn DisplaySurface> {
        &self.surface
    }

    pub fn state(&self) -> SurfaceState {
        self.state.get()
    }

    /// Guest currently bound to this surface, if any.
    pub fn guest(&self) -> Option<GuestId> {
        self.guest.get()
    }

    /// Whether the surface has been through its first-attach paint fix.
    pub fn has_painted(&self) -> bool {
        self.painted.get()
    }

    pub(crate) fn set_state(&self, state: SurfaceState) {
        self.state.set(state);
    }

    pub(crate) fn set_guest(&self, guest: Option<GuestId>) {
        self.guest.set(guest);
    }

    /// Returns `true` exactly once: the first time this surface is painted.
    pub(crate) fn take_first_paint(&self) -> bool {
        !self.painted.replace(true)
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("guest", &self.guest.get())
            .finish()
    }
}
