//! Attach state and its serializable snapshot.

use std::rc::Rc;

use guestview_common::{GuestId, SurfaceId};
use serde::Serialize;

use crate::surface::{SurfaceHandle, SurfaceState};

/// The surface currently displayed.
#[derive(Clone)]
pub(crate) struct Active {
    pub guest: GuestId,
    pub handle: Rc<SurfaceHandle>,
}

/// The one attach sequence that may be running.
pub(crate) struct InFlight {
    /// Most recently requested guest. Requests made while a sequence runs
    /// overwrite this; the sequence checks it at every resumption point.
    pub target: GuestId,
    /// Guest the sequence is binding right now.
    pub binding: GuestId,
    pub handle: Rc<SurfaceHandle>,
    /// Surface to retire once `handle` is revealed.
    pub previous: Option<Rc<SurfaceHandle>>,
}

#[derive(Default)]
pub(crate) struct Slots {
    pub attached: Option<Active>,
    pub in_flight: Option<InFlight>,
    pub focus_pending: bool,
    pub disposed: bool,
}

impl Slots {
    pub fn target(&self) -> Option<GuestId> {
        self.in_flight.as_ref().map(|f| f.target)
    }

    pub fn active_guest(&self) -> Option<GuestId> {
        self.attached.as_ref().map(|a| a.guest)
    }

    /// An attach toward a different guest than the one shown is under way.
    pub fn is_switching_away(&self) -> bool {
        self.target().is_some_and(|t| Some(t) != self.active_guest())
    }

    pub fn phase(&self) -> Phase {
        if let Some(flight) = &self.in_flight {
            Phase::Attaching {
                target: flight.target,
                binding: flight.binding,
                surface: flight.handle.id(),
                previous: flight.previous.as_ref().map(|p| p.id()),
            }
        } else if let Some(active) = &self.attached {
            Phase::Attached {
                guest: active.guest,
                surface: active.handle.id(),
            }
        } else {
            Phase::Idle
        }
    }
}

/// Where the display is in the attach protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Attaching {
        target: GuestId,
        binding: GuestId,
        surface: SurfaceId,
        previous: Option<SurfaceId>,
    },
    Attached {
        guest: GuestId,
        surface: SurfaceId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceSnapshot {
    pub id: SurfaceId,
    pub state: SurfaceState,
    pub guest: Option<GuestId>,
}

/// Point-in-time view of the display and its pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySnapshot {
    pub phase: Phase,
    pub active_guest: Option<GuestId>,
    pub free: usize,
    pub created: u32,
    pub focus_pending: bool,
    pub disposed: bool,
    pub surfaces: Vec<SurfaceSnapshot>,
}

impl DisplaySnapshot {
    /// Number of surfaces in `state`.
    pub fn count(&self, state: SurfaceState) -> usize {
        self.surfaces.iter().filter(|s| s.state == state).count()
    }
}
