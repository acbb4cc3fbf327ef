//! Ctrl+wheel zoom with a debounce.
//!
//! Wheel deltas arrive in bursts. They are summed while ctrl is held and
//! applied as a single zoom step once the burst has been quiet for the
//! debounce interval.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use crate::surface::DisplaySurface;

pub struct WheelZoom {
    surface: Weak<dyn DisplaySurface>,
    debounce: Duration,
    on_change: Rc<dyn Fn(u32)>,
    delta_y: Cell<f64>,
    generation: Cell<u64>,
}

impl WheelZoom {
    pub fn new(
        surface: Weak<dyn DisplaySurface>,
        debounce: Duration,
        on_change: Rc<dyn Fn(u32)>,
    ) -> Self {
        Self {
            surface,
            debounce,
            on_change,
            delta_y: Cell::new(0.0),
            generation: Cell::new(0),
        }
    }

    /// Feed one wheel event. Must be called inside a `LocalSet`.
    pub fn handle_wheel(self: &Rc<Self>, delta_y: f64, ctrl: bool) {
        if !ctrl {
            self.delta_y.set(0.0);
            return;
        }
        self.delta_y.set(self.delta_y.get() + delta_y);
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let zoom = Rc::clone(self);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(zoom.debounce).await;
            if zoom.generation.get() == generation {
                zoom.apply();
            }
        });
    }

    pub fn pending_delta(&self) -> f64 {
        self.delta_y.get()
    }

    fn apply(&self) {
        let delta = self.delta_y.replace(0.0);
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        if delta > 0.0 {
            surface.zoom_in();
        } else if delta < 0.0 {
            surface.zoom_out();
        } else {
            return;
        }
        let percent = surface.zoom_percent();
        debug!(percent, "zoom changed");
        (self.on_change)(percent);
    }
}
