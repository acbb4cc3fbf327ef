//! Per-surface input wiring.
//!
//! Every surface gets exactly one listener, installed when the pool creates
//! it. The listener only holds weak references so a removed surface does
//! not keep the display alive.

use std::rc::{Rc, Weak};

use tracing::{debug, info};

use super::Inner;
use crate::surface::{SurfaceHandle, SurfaceInput};
use crate::zoom::WheelZoom;

const NEW_TAB_URL: &str = "about:newtab";

pub(super) fn install(inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    inner
        .pool
        .borrow_mut()
        .set_on_created(move |handle| wire(&weak, handle));
}

fn wire(inner: &Weak<Inner>, handle: &Rc<SurfaceHandle>) {
    let Some(strong) = inner.upgrade() else {
        return;
    };
    let zoom = Rc::new(WheelZoom::new(
        Rc::downgrade(handle.surface()),
        strong.options.zoom_debounce,
        Rc::clone(&strong.on_zoom_change),
    ));
    let inner = inner.clone();
    let surface_handle = Rc::downgrade(handle);
    let id = handle.id();

    handle.surface().set_input_listener(Box::new(move |input| {
        debug!(surface = %id, ?input, "surface input");
        let (Some(inner), Some(handle)) = (inner.upgrade(), surface_handle.upgrade()) else {
            return;
        };
        match input {
            SurfaceInput::Focus => (inner.on_focus)(),
            SurfaceInput::Wheel { delta_y, ctrl } => zoom.handle_wheel(delta_y, ctrl),
            SurfaceInput::Navigated { url } => {
                // Don't steal focus for a blank tab, or from the surface
                // that is about to be replaced.
                let switching_away = inner.slots.borrow().is_switching_away();
                if !is_new_tab_page(&url) && !switching_away {
                    handle.surface().focus();
                }
            }
            SurfaceInput::TabDetachedAt => {
                let detached = handle.guest();
                info!(surface = %id, guest = ?detached, "guest detached from surface by the host");
                let host = Rc::clone(&inner.host);
                tokio::task::spawn_local(async move {
                    host.unbind_session(id).await;
                    // The surface may have been rebound meanwhile
                    if handle.guest() == detached {
                        handle.set_guest(None);
                    }
                });
            }
            SurfaceInput::Diagnostic(_) => {}
        }
    }));
}

fn is_new_tab_page(url: &str) -> bool {
    url.split(|c| c == '?' || c == '#').next() == Some(NEW_TAB_URL)
}
