//! In-memory host, container, and surfaces.
//!
//! These stand in for a real content host and native views. They record
//! everything done to them so tests and the simulator can inspect it, and
//! they let the caller play the host's side: open and destroy guests,
//! confirm attaches, and inject surface input.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use guestview_common::{DisplayError, EventBridge, GuestEventKind, GuestId, SurfaceId};
use tracing::debug;

use crate::host::{ContentHost, SessionHandle};
use crate::surface::{DisplaySurface, InputListener, SurfaceContainer, SurfaceInput};

const MIN_ZOOM: u32 = 30;
const MAX_ZOOM: u32 = 500;
const ZOOM_STEP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChange {
    Hidden(bool),
    TopOffset(i32),
}

pub struct MemorySurface {
    id: SurfaceId,
    classes: RefCell<BTreeSet<String>>,
    class_log: RefCell<Vec<(String, bool)>>,
    style_log: RefCell<Vec<StyleChange>>,
    hidden: Cell<bool>,
    top_offset: Cell<i32>,
    focus_count: Cell<u32>,
    zoom: Cell<u32>,
    removed: Cell<bool>,
    listener: RefCell<Option<InputListener>>,
    listener_installs: Cell<u32>,
}

impl MemorySurface {
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            classes: RefCell::new(BTreeSet::new()),
            class_log: RefCell::new(Vec::new()),
            style_log: RefCell::new(Vec::new()),
            hidden: Cell::new(false),
            top_offset: Cell::new(0),
            focus_count: Cell::new(0),
            zoom: Cell::new(100),
            removed: Cell::new(false),
            listener: RefCell::new(None),
            listener_installs: Cell::new(0),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    /// Whether `class` was ever added to this surface.
    pub fn ever_had_class(&self, class: &str) -> bool {
        self.class_log
            .borrow()
            .iter()
            .any(|(name, added)| *added && name == class)
    }

    pub fn style_log(&self) -> Vec<StyleChange> {
        self.style_log.borrow().clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn top_offset(&self) -> i32 {
        self.top_offset.get()
    }

    pub fn focus_count(&self) -> u32 {
        self.focus_count.get()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub fn listener_installs(&self) -> u32 {
        self.listener_installs.get()
    }

    /// Deliver input as if the user or the guest produced it.
    pub fn dispatch(&self, input: SurfaceInput) {
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(input);
        }
    }
}

impl DisplaySurface for MemorySurface {
    fn add_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
        self.class_log.borrow_mut().push((class.to_string(), true));
    }

    fn remove_class(&self, class: &str) {
        if self.classes.borrow_mut().remove(class) {
            self.class_log.borrow_mut().push((class.to_string(), false));
        }
    }

    fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
        self.style_log.borrow_mut().push(StyleChange::Hidden(hidden));
    }

    fn set_top_offset(&self, px: i32) {
        self.top_offset.set(px);
        self.style_log.borrow_mut().push(StyleChange::TopOffset(px));
    }

    fn focus(&self) {
        self.focus_count.set(self.focus_count.get() + 1);
    }

    fn zoom_in(&self) {
        self.zoom.set((self.zoom.get() + ZOOM_STEP).min(MAX_ZOOM));
    }

    fn zoom_out(&self) {
        self.zoom.set(self.zoom.get().saturating_sub(ZOOM_STEP).max(MIN_ZOOM));
    }

    fn zoom_percent(&self) -> u32 {
        self.zoom.get()
    }

    fn set_input_listener(&self, listener: InputListener) {
        self.listener_installs.set(self.listener_installs.get() + 1);
        *self.listener.borrow_mut() = Some(listener);
    }

    fn remove(&self) {
        self.removed.set(true);
        self.listener.borrow_mut().take();
    }
}

/// Container that keeps every surface it creates.
pub struct MemoryContainer {
    surfaces: RefCell<Vec<Rc<MemorySurface>>>,
    capacity: Option<usize>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self {
            surfaces: RefCell::new(Vec::new()),
            capacity: None,
        }
    }

    /// A container that fails once `capacity` surfaces exist.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            surfaces: RefCell::new(Vec::new()),
            capacity: Some(capacity),
        }
    }

    pub fn surfaces(&self) -> Vec<Rc<MemorySurface>> {
        self.surfaces.borrow().clone()
    }

    pub fn surface(&self, id: SurfaceId) -> Option<Rc<MemorySurface>> {
        self.surfaces.borrow().iter().find(|s| s.id() == id).cloned()
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceContainer for MemoryContainer {
    fn create_surface(
        &self,
        id: SurfaceId,
        base_class: &str,
    ) -> Result<Rc<dyn DisplaySurface>, DisplayError> {
        let mut surfaces = self.surfaces.borrow_mut();
        if self.capacity.is_some_and(|cap| surfaces.len() >= cap) {
            return Err(DisplayError::SurfaceCreation(format!(
                "container is full ({} surfaces)",
                surfaces.len()
            )));
        }
        let surface = Rc::new(MemorySurface::new(id));
        surface.add_class(base_class);
        surfaces.push(Rc::clone(&surface));
        Ok(surface)
    }
}

#[derive(Debug, Clone, Copy)]
struct MemorySession {
    instance_id: u64,
    destroyed: bool,
}

/// Content host that keeps sessions in memory and reports lifecycle
/// transitions through an [`EventBridge`].
pub struct MemoryHost {
    bridge: Arc<EventBridge>,
    sessions: RefCell<HashMap<GuestId, MemorySession>>,
    bindings: RefCell<HashMap<SurfaceId, GuestId>>,
    bind_log: RefCell<Vec<(SurfaceId, GuestId)>>,
    auto_confirm: Cell<bool>,
    next_instance: Cell<u64>,
}

impl MemoryHost {
    pub fn new(bridge: Arc<EventBridge>) -> Self {
        Self {
            bridge,
            sessions: RefCell::new(HashMap::new()),
            bindings: RefCell::new(HashMap::new()),
            bind_log: RefCell::new(Vec::new()),
            auto_confirm: Cell::new(false),
            next_instance: Cell::new(1),
        }
    }

    /// When set, every bind is immediately followed by an `attached`
    /// notification.
    pub fn set_auto_confirm(&self, enabled: bool) {
        self.auto_confirm.set(enabled);
    }

    /// Create a live session for `guest`.
    pub fn open(&self, guest: GuestId) -> SessionHandle {
        let instance_id = self.next_instance.get();
        self.next_instance.set(instance_id + 1);
        self.sessions.borrow_mut().insert(
            guest,
            MemorySession {
                instance_id,
                destroyed: false,
            },
        );
        SessionHandle { guest, instance_id }
    }

    /// Destroy a guest: notify subscribers and drop its bindings.
    pub fn destroy(&self, guest: GuestId) {
        if let Some(session) = self.sessions.borrow_mut().get_mut(&guest) {
            session.destroyed = true;
        }
        self.bridge.emit(guest, GuestEventKind::Destroying);
        self.bindings.borrow_mut().retain(|_, g| *g != guest);
        self.bridge.emit(guest, GuestEventKind::Destroyed);
    }

    /// Report that `guest` finished attaching. Returns the delivery count.
    pub fn confirm(&self, guest: GuestId) -> usize {
        self.bridge.emit(guest, GuestEventKind::Attached)
    }

    pub fn bound_guest(&self, surface: SurfaceId) -> Option<GuestId> {
        self.bindings.borrow().get(&surface).copied()
    }

    /// Surfaces `guest` is currently bound to.
    pub fn surfaces_for(&self, guest: GuestId) -> Vec<SurfaceId> {
        let mut surfaces: Vec<_> = self
            .bindings
            .borrow()
            .iter()
            .filter(|(_, g)| **g == guest)
            .map(|(s, _)| *s)
            .collect();
        surfaces.sort();
        surfaces
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn bind_log(&self) -> Vec<(SurfaceId, GuestId)> {
        self.bind_log.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ContentHost for MemoryHost {
    async fn session(&self, guest: GuestId) -> Option<SessionHandle> {
        tokio::task::yield_now().await;
        self.sessions
            .borrow()
            .get(&guest)
            .map(|s| SessionHandle {
                guest,
                instance_id: s.instance_id,
            })
    }

    fn is_destroyed(&self, session: &SessionHandle) -> bool {
        self.sessions
            .borrow()
            .get(&session.guest)
            .map_or(true, |s| s.destroyed || s.instance_id != session.instance_id)
    }

    fn bind_session(&self, surface: SurfaceId, session: &SessionHandle) {
        debug!(%surface, guest = %session.guest, "binding session");
        self.bindings.borrow_mut().insert(surface, session.guest);
        self.bind_log.borrow_mut().push((surface, session.guest));
        self.bridge.emit(session.guest, GuestEventKind::Attaching);
        if self.auto_confirm.get() {
            self.bridge.emit(session.guest, GuestEventKind::Attached);
        }
    }

    async fn unbind_session(&self, surface: SurfaceId) {
        tokio::task::yield_now().await;
        let guest = self.bindings.borrow_mut().remove(&surface);
        if let Some(guest) = guest {
            debug!(%surface, %guest, "unbinding session");
            self.bridge.emit(guest, GuestEventKind::Detaching);
            self.bridge.emit(guest, GuestEventKind::Detached);
        }
    }
}
