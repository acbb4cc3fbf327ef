//! Pooled display of host-managed guest content.
//!
//! Shows one guest (tab) at a time inside a small pool of reusable native
//! surfaces:
//! - A surface pool that keeps free surfaces ready and recycles them
//! - An attach orchestrator that binds guests to surfaces, reveals them
//!   without a blank flash, and coalesces rapid show requests
//! - Paint-forcing transitions run across frame boundaries
//! - Ctrl+wheel zoom and focus handling wired once per surface
//!
//! Everything runs on one thread. Background steps are spawned with
//! `tokio::task::spawn_local`, so a [`GuestDisplay`] must be driven from
//! inside a `tokio::task::LocalSet`.

pub mod frame;
pub mod host;
pub mod memory;
pub mod options;
pub mod orchestrator;
pub mod pool;
pub mod surface;
pub mod transition;
pub mod zoom;

pub use frame::{FrameClock, TokioFrameClock};
pub use host::{ContentHost, SessionHandle};
pub use options::DisplayOptions;
pub use orchestrator::{DisplaySnapshot, GuestDisplay, GuestDisplayBuilder, Phase, SurfaceSnapshot};
pub use pool::SurfacePool;
pub use surface::{
    DisplaySurface, InputListener, SurfaceContainer, SurfaceHandle, SurfaceInput, SurfaceState,
};
