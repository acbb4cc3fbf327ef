//! Pool of reusable display surfaces.
//!
//! Surfaces are expensive to create, so they are created only when the pool
//! runs short and are recycled on every swap. They are destroyed only by an
//! explicit teardown.

use std::rc::Rc;

use guestview_common::{DisplayError, SurfaceId};
use tracing::{debug, warn};

use crate::surface::{SurfaceContainer, SurfaceHandle, SurfaceState};

type CreatedHook = Box<dyn Fn(&Rc<SurfaceHandle>)>;

pub struct SurfacePool {
    container: Rc<dyn SurfaceContainer>,
    base_class: String,
    idle_size: usize,
    attached_size: usize,
    /// Every live surface, in creation order.
    surfaces: Vec<Rc<SurfaceHandle>>,
    free: Vec<Rc<SurfaceHandle>>,
    next_id: u32,
    on_created: Option<CreatedHook>,
}

impl SurfacePool {
    pub fn new(
        container: Rc<dyn SurfaceContainer>,
        base_class: impl Into<String>,
        idle_size: usize,
        attached_size: usize,
    ) -> Self {
        Self {
            container,
            base_class: base_class.into(),
            idle_size: idle_size.max(1),
            attached_size: attached_size.max(1),
            surfaces: Vec::new(),
            free: Vec::new(),
            next_id: 0,
            on_created: None,
        }
    }

    /// Hook run once for each surface right after it is created.
    pub fn set_on_created(&mut self, hook: impl Fn(&Rc<SurfaceHandle>) + 'static) {
        self.on_created = Some(Box::new(hook));
    }

    /// Top up the free list: `attached_size` free surfaces while one is
    /// attached, `idle_size` otherwise. Returns how many were created.
    pub fn ensure_size(&mut self, attached: bool) -> Result<usize, DisplayError> {
        let required = if attached {
            self.attached_size
        } else {
            self.idle_size
        };
        let deficit = required.saturating_sub(self.free.len());
        if deficit > 0 {
            debug!(deficit, "adding pooled surface(s)");
        }
        for _ in 0..deficit {
            let handle = self.create()?;
            self.free.push(handle);
        }
        Ok(deficit)
    }

    /// Hand out a free surface, topping up the pool first.
    pub fn acquire(&mut self, attached: bool) -> Result<Rc<SurfaceHandle>, DisplayError> {
        self.ensure_size(attached)?;
        match self.free.pop() {
            Some(handle) => Ok(handle),
            None => self.create(),
        }
    }

    /// Return a surface to the free list. Its guest must already be unbound.
    pub fn release(&mut self, handle: Rc<SurfaceHandle>) {
        if let Some(guest) = handle.guest() {
            warn!(surface = %handle.id(), %guest, "releasing surface with a guest still bound");
        }
        if self.free.iter().any(|h| h.id() == handle.id()) {
            debug!(surface = %handle.id(), "surface already free");
            return;
        }
        handle.set_state(SurfaceState::Free);
        self.free.push(handle);
    }

    /// Remove every surface from the pool, free or not, for teardown.
    pub fn drain(&mut self) -> Vec<Rc<SurfaceHandle>> {
        self.free.clear();
        std::mem::take(&mut self.surfaces)
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// All live surfaces in creation order.
    pub fn surfaces(&self) -> &[Rc<SurfaceHandle>] {
        &self.surfaces
    }

    /// Total surfaces ever created by this pool.
    pub fn created(&self) -> u32 {
        self.next_id
    }

    fn create(&mut self) -> Result<Rc<SurfaceHandle>, DisplayError> {
        let id = SurfaceId(self.next_id);
        let surface = self.container.create_surface(id, &self.base_class)?;
        self.next_id += 1;
        let handle = Rc::new(SurfaceHandle::new(id, surface));
        if let Some(hook) = &self.on_created {
            hook(&handle);
        }
        debug!(surface = %id, "created surface");
        self.surfaces.push(Rc::clone(&handle));
        Ok(handle)
    }
}
