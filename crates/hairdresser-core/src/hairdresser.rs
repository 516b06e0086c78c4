// ── Hairdresser ──
//
// Root object. Owns the active-controller registry, the observer list and
// the id generators; hands out overrides and starts render sessions. Cloning
// a `Hairdresser` yields another handle to the same instance.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::controller::{Controller, ControllerKind};
use crate::engine::{EventHandler, EventManager, RenderSession};
use crate::error::HeadError;
use crate::listener::ListenerOptions;
use crate::model::{IdGenerator, ObserverId, to_selector};
use crate::overrides::{Override, OverrideRef};
use crate::store::{ActiveRegistry, ObserverList};

/// Receives lifecycle notifications from a [`Hairdresser`].
///
/// Every method defaults to doing nothing. An error from `on_add_controller`
/// undoes the registration; an error from `on_pre_remove_override` is
/// returned after the override has been restored anyway.
pub trait Observer {
    /// A controller was registered and is now active for its selector.
    fn on_add_controller(&self, _controller: &Rc<Controller>) -> Result<(), HeadError> {
        Ok(())
    }

    /// [`Override::update`] was called.
    fn on_update(&self, _owner: &OverrideRef) -> Result<(), HeadError> {
        Ok(())
    }

    /// Registering `controller` failed in a later observer and is being
    /// undone. It is still linked; its predecessor becomes active again
    /// once every observer has run.
    fn on_abort_controller(&self, _controller: &Rc<Controller>) -> Result<(), HeadError> {
        Ok(())
    }

    /// [`Override::restore`] is about to unlink `controllers`.
    fn on_pre_remove_override(
        &self,
        _owner: &OverrideRef,
        _controllers: &[Rc<Controller>],
    ) -> Result<(), HeadError> {
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    registry: RefCell<ActiveRegistry>,
    observers: RefCell<ObserverList>,
    override_ids: IdGenerator,
    controller_ids: IdGenerator,
}

#[derive(Clone, Default)]
pub struct Hairdresser {
    inner: Rc<Inner>,
}

impl Hairdresser {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Overrides ────────────────────────────────────────────────────

    /// Start a new override without an override-level event source.
    pub fn new_override(&self) -> Override {
        Override::new(self.clone(), self.inner.override_ids.next(), None)
    }

    /// Start a new override whose controllers all re-render when `listener` fires.
    pub fn new_override_with(&self, listener: ListenerOptions) -> Result<Override, HeadError> {
        let source = listener.into_source()?;
        Ok(Override::new(
            self.clone(),
            self.inner.override_ids.next(),
            source,
        ))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The controller currently authoritative for `tag_name` + `attrs`.
    pub fn active_controller<I, K, V>(&self, tag_name: &str, attrs: I) -> Option<Rc<Controller>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let selector = format!("{tag_name}{}", to_selector(attrs));
        self.inner.registry.borrow().get(&selector)
    }

    /// Every active controller, sorted by selector.
    pub fn active_controllers(&self) -> Vec<Rc<Controller>> {
        self.inner.registry.borrow().snapshot()
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn add_observer(&self, observer: Rc<dyn Observer>) -> ObserverId {
        self.inner.observers.borrow_mut().add(observer)
    }

    /// Returns `false` when the id was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.observers.borrow_mut().remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Dispatch every active controller once, in selector order.
    pub fn render_once(
        &self,
        title_handler: &dyn EventHandler,
        etc_handler: &dyn EventHandler,
    ) -> Result<(), HeadError> {
        for controller in self.active_controllers() {
            match controller.kind() {
                ControllerKind::Title => title_handler.on_update(&controller)?,
                ControllerKind::Etc => etc_handler.on_update(&controller)?,
            }
        }
        Ok(())
    }

    /// Render every active controller and keep the output in sync.
    ///
    /// Each active controller is started on a fresh [`EventManager`]. An
    /// observer then follows controller insertion, override updates and
    /// override removal until [`RenderSession::stop`] is called.
    pub fn render_and_listen(
        &self,
        title_handler: Rc<dyn EventHandler>,
        etc_handler: Rc<dyn EventHandler>,
    ) -> Result<RenderSession, HeadError> {
        let manager = Rc::new(EventManager::new(title_handler, etc_handler));

        for controller in self.active_controllers() {
            if let Err(err) = manager.start_listening_controller(&controller) {
                if let Err(cleanup) = manager.destroy() {
                    warn!(error = %cleanup, "failed to tear down half-started render session");
                }
                return Err(err);
            }
        }

        let session = RenderSession::start(self.clone(), manager);
        debug!(
            active = self.inner.registry.borrow().len(),
            observers = self.observer_count(),
            "render session started"
        );
        Ok(session)
    }

    // ── Override plumbing ────────────────────────────────────────────

    /// Assign identity, link into the selector chain, make active, notify.
    pub(crate) fn register_controller(
        &self,
        owner: &OverrideRef,
        controller: Rc<Controller>,
    ) -> Result<(), HeadError> {
        controller.bind(self.inner.controller_ids.next(), owner.clone())?;
        self.inner.registry.borrow_mut().push(&controller);
        trace!(
            controller = %controller.id(),
            override_id = %owner.id(),
            selector = controller.selector(),
            "controller registered"
        );

        let notified = self
            .observers()
            .iter()
            .try_for_each(|observer| observer.on_add_controller(&controller));
        if let Err(err) = notified {
            self.abort_controller(&controller);
            return Err(err);
        }
        Ok(())
    }

    /// Undo a registration whose observers failed: sessions hand the element
    /// back to the predecessor, then the registry does.
    fn abort_controller(&self, controller: &Rc<Controller>) {
        for observer in self.observers() {
            if let Err(err) = observer.on_abort_controller(controller) {
                warn!(
                    controller = %controller.id(),
                    error = %err,
                    "failed to hand element back after aborted registration"
                );
            }
        }
        self.inner.registry.borrow_mut().release(controller);
        debug!(
            controller = %controller.id(),
            selector = controller.selector(),
            "controller registration undone"
        );
    }

    pub(crate) fn notify_update(&self, owner: &OverrideRef) -> Result<(), HeadError> {
        for observer in self.observers() {
            observer.on_update(owner)?;
        }
        Ok(())
    }

    pub(crate) fn notify_pre_remove(
        &self,
        owner: &OverrideRef,
        controllers: &[Rc<Controller>],
    ) -> Result<(), HeadError> {
        let mut first_error = None;
        for observer in self.observers() {
            if let Err(err) = observer.on_pre_remove_override(owner, controllers) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Unlink restored controllers, promoting predecessors where they were active.
    pub(crate) fn release_controllers(&self, controllers: &[Rc<Controller>]) {
        let mut registry = self.inner.registry.borrow_mut();
        for controller in controllers {
            registry.release(controller);
        }
    }

    fn observers(&self) -> Vec<Rc<dyn Observer>> {
        self.inner.observers.borrow().snapshot()
    }
}

impl fmt::Debug for Hairdresser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hairdresser")
            .field("active", &self.inner.registry.borrow().len())
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}
