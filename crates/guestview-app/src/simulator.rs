//! Plays a scenario against a display backed by the in-memory host.

use std::rc::Rc;
use std::sync::Arc;

use guestview_common::{DisplayError, EventBridge};
use guestview_display::memory::{MemoryContainer, MemoryHost};
use guestview_display::{DisplayOptions, DisplaySnapshot, GuestDisplay, SurfaceInput};
use tracing::{info, warn};

use crate::scenario::Command;

pub struct Simulator {
    display: GuestDisplay,
    host: Rc<MemoryHost>,
    container: Rc<MemoryContainer>,
    snapshots: Vec<DisplaySnapshot>,
}

impl Simulator {
    pub fn new(options: DisplayOptions) -> Result<Self, DisplayError> {
        let bridge = Arc::new(EventBridge::new());
        let host = Rc::new(MemoryHost::new(Arc::clone(&bridge)));
        let container = Rc::new(MemoryContainer::new());
        let display = GuestDisplay::builder(options)
            .container(container.clone())
            .host(host.clone())
            .bridge(bridge)
            .on_focus(|| info!("surface focused by user"))
            .on_zoom_change(|percent| info!(percent, "zoom changed"))
            .build()?;
        Ok(Self {
            display,
            host,
            container,
            snapshots: Vec::new(),
        })
    }

    /// Run every command in order. Must be awaited inside a `LocalSet`.
    pub async fn run(&mut self, commands: &[Command]) -> Result<(), DisplayError> {
        for command in commands {
            self.step(command).await?;
        }
        Ok(())
    }

    async fn step(&mut self, command: &Command) -> Result<(), DisplayError> {
        match command {
            Command::Open(guest) => {
                let session = self.host.open(*guest);
                info!(%guest, instance = session.instance_id, "guest opened");
            }
            Command::Show(guest) => match self.display.request_show(*guest) {
                Ok(()) | Err(DisplayError::Disposed) => {}
                Err(e) => return Err(e),
            },
            Command::Confirm(guest) => {
                let delivered = self.host.confirm(*guest);
                if delivered == 0 {
                    warn!(%guest, "confirmation had no listener");
                }
            }
            Command::Destroy(guest) => self.host.destroy(*guest),
            Command::AutoConfirm(enabled) => self.host.set_auto_confirm(*enabled),
            Command::Focus => self.display.focus_active(),
            Command::Wheel { delta_y, ctrl } => self.dispatch(SurfaceInput::Wheel {
                delta_y: *delta_y,
                ctrl: *ctrl,
            }),
            Command::Navigate(url) => {
                self.dispatch(SurfaceInput::Navigated { url: url.clone() })
            }
            Command::Wait(duration) => tokio::time::sleep(*duration).await,
            Command::Snapshot => {
                let snapshot = self.display.snapshot();
                info!(phase = ?snapshot.phase, free = snapshot.free, "snapshot");
                self.snapshots.push(snapshot);
            }
            Command::Teardown => self.display.teardown().await,
        }
        Ok(())
    }

    /// Deliver input to the shown surface, as the user would.
    fn dispatch(&self, input: SurfaceInput) {
        let surface = self
            .display
            .active_surface()
            .and_then(|handle| self.container.surface(handle.id()));
        match surface {
            Some(surface) => surface.dispatch(input),
            None => warn!(?input, "no surface shown, input dropped"),
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.display.snapshot()
    }

    /// Snapshots taken by `snapshot` commands, in order.
    pub fn snapshots(&self) -> &[DisplaySnapshot] {
        &self.snapshots
    }
}
