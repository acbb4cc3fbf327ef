//! Paint forcing after a guest attaches.
//!
//! A freshly attached guest is often not painted until its surface changes
//! size or visibility. The very first paint of a new surface is the least
//! reliable, so it gets a full hide/show cycle; later attaches only need a
//! one-pixel nudge.

use tracing::debug;

use crate::frame::FrameClock;
use crate::surface::{DisplaySurface, SurfaceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintKind {
    FirstAttach,
    SubsequentAttach,
}

/// Hide and re-show the surface across frame boundaries, then wait one
/// more frame for the result to commit.
pub async fn on_first_attach(surface: &dyn DisplaySurface, clock: &dyn FrameClock) {
    clock.next_frame().await;
    surface.set_hidden(true);
    clock.next_frame().await;
    surface.set_hidden(false);
    clock.next_frame().await;
}

pub async fn on_subsequent_attach(surface: &dyn DisplaySurface, clock: &dyn FrameClock) {
    surface.set_top_offset(1);
    clock.next_frame().await;
    surface.set_top_offset(0);
}

/// Run whichever sequence this surface needs and remember that it has had
/// its first paint.
pub async fn force_paint(handle: &SurfaceHandle, clock: &dyn FrameClock) -> PaintKind {
    let kind = if handle.take_first_paint() {
        on_first_attach(handle.surface().as_ref(), clock).await;
        PaintKind::FirstAttach
    } else {
        on_subsequent_attach(handle.surface().as_ref(), clock).await;
        PaintKind::SubsequentAttach
    };
    debug!(surface = %handle.id(), ?kind, "forced paint");
    kind
}

/// Full hide/show cycle regardless of history. Used when the host never
/// confirmed the attach, since a reused surface may not repaint from a
/// nudge alone.
pub async fn force_full_paint(handle: &SurfaceHandle, clock: &dyn FrameClock) -> PaintKind {
    handle.take_first_paint();
    on_first_attach(handle.surface().as_ref(), clock).await;
    debug!(surface = %handle.id(), "forced full paint");
    PaintKind::FirstAttach
}
