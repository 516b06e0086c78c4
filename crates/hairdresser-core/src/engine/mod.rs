// ── Listener coordination engine ──
//
// One `EventManager` per render session. It keeps exactly the active
// controllers subscribed to their host event sources and routes every
// re-render and teardown through the session's `EventHandler`s.

mod listener;
mod session;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::controller::{Controller, ControllerKind};
use crate::error::HeadError;
use crate::model::{ControllerId, OverrideId};
use crate::overrides::OverrideRef;

use listener::{ControllerListener, OverrideListener};
pub use session::RenderSession;

/// Side effects of a render session.
///
/// `on_update` renders a controller's current value; `on_stop` runs when the
/// controller stops being the one rendered (takeover, restore or session end).
pub trait EventHandler {
    fn on_update(&self, controller: &Controller) -> Result<(), HeadError>;

    fn on_stop(&self, _controller: &Controller) -> Result<(), HeadError> {
        Ok(())
    }
}

pub struct EventManager {
    title_handler: Rc<dyn EventHandler>,
    etc_handler: Rc<dyn EventHandler>,
    override_listeners: RefCell<HashMap<OverrideId, Rc<OverrideListener>>>,
    controller_listeners: RefCell<BTreeMap<ControllerId, Rc<ControllerListener>>>,
}

impl EventManager {
    pub fn new(title_handler: Rc<dyn EventHandler>, etc_handler: Rc<dyn EventHandler>) -> Self {
        Self {
            title_handler,
            etc_handler,
            override_listeners: RefCell::new(HashMap::new()),
            controller_listeners: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn is_controller_listening(&self, controller: &Controller) -> bool {
        self.controller_listener(controller.id())
            .is_some_and(|listener| listener.is_listening())
    }

    /// Render `controller` once, then subscribe it to its event sources.
    ///
    /// If the first render fails the controller is left unsubscribed.
    pub fn start_listening_controller(&self, controller: &Rc<Controller>) -> Result<(), HeadError> {
        let listener = self.ensure_controller_listener(controller)?;
        if listener.is_listening() {
            return Err(HeadError::invariant(format!(
                "{} is already listening",
                controller.id()
            )));
        }

        listener.update()?;
        listener.start_listening();
        trace!(controller = %controller.id(), "listening started");
        Ok(())
    }

    /// Unsubscribe `controller`, then run its stop handler.
    pub fn stop_listening_controller(&self, controller: &Controller) -> Result<(), HeadError> {
        let listener = self
            .controller_listener(controller.id())
            .filter(|listener| listener.is_listening())
            .ok_or_else(|| HeadError::invariant("Only listening controller can be stopped"))?;

        listener.stop_listening();
        trace!(controller = %controller.id(), "listening stopped");
        listener.stop()
    }

    /// Forget a stopped controller. Unknown controllers are ignored.
    pub fn remove_controller(&self, controller: &Controller) -> Result<(), HeadError> {
        let mut listeners = self.controller_listeners.borrow_mut();
        let Some(listener) = listeners.get(&controller.id()) else {
            return Ok(());
        };
        if listener.is_listening() {
            return Err(HeadError::invariant(format!(
                "listener of {} is not ready to remove",
                controller.id()
            )));
        }
        listeners.remove(&controller.id());
        Ok(())
    }

    /// Re-render every listening controller of an override.
    pub fn update_override(&self, owner: &OverrideRef) -> Result<(), HeadError> {
        let listener = self.override_listeners.borrow().get(&owner.id()).map(Rc::clone);
        match listener {
            Some(listener) => listener.update(),
            None => Ok(()),
        }
    }

    /// Forget an override whose controllers have all stopped.
    pub fn remove_override(&self, owner: &OverrideRef) -> Result<(), HeadError> {
        let mut listeners = self.override_listeners.borrow_mut();
        let Some(listener) = listeners.get(&owner.id()) else {
            return Ok(());
        };
        if !listener.is_ready_to_remove() {
            return Err(HeadError::invariant(format!(
                "listener of {} is not ready to remove",
                owner.id()
            )));
        }
        listeners.remove(&owner.id());
        Ok(())
    }

    /// Stop every listening controller and drop all bookkeeping.
    ///
    /// Every controller is stopped even if an earlier stop handler fails;
    /// the first failure is returned.
    pub fn destroy(&self) -> Result<(), HeadError> {
        let listening: Vec<_> = self
            .controller_listeners
            .borrow()
            .values()
            .filter(|listener| listener.is_listening())
            .map(Rc::clone)
            .collect();

        let mut first_error = None;
        for listener in listening {
            listener.stop_listening();
            if let Err(err) = listener.stop() {
                first_error.get_or_insert(err);
            }
        }

        self.controller_listeners.borrow_mut().clear();
        self.override_listeners.borrow_mut().clear();
        first_error.map_or(Ok(()), Err)
    }

    /// Number of controllers currently subscribed.
    pub fn listening_count(&self) -> usize {
        self.controller_listeners
            .borrow()
            .values()
            .filter(|listener| listener.is_listening())
            .count()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn controller_listener(&self, id: ControllerId) -> Option<Rc<ControllerListener>> {
        self.controller_listeners.borrow().get(&id).map(Rc::clone)
    }

    fn ensure_override_listener(&self, owner: &OverrideRef) -> Rc<OverrideListener> {
        Rc::clone(
            self.override_listeners
                .borrow_mut()
                .entry(owner.id())
                .or_insert_with(|| OverrideListener::new(owner.clone())),
        )
    }

    fn ensure_controller_listener(
        &self,
        controller: &Rc<Controller>,
    ) -> Result<Rc<ControllerListener>, HeadError> {
        if let Some(listener) = self.controller_listener(controller.id()) {
            return Ok(listener);
        }

        let owner = controller.owner().ok_or_else(|| {
            HeadError::invariant(format!(
                "controller for '{}' is not registered with an override",
                controller.selector()
            ))
        })?;
        let handler = match controller.kind() {
            ControllerKind::Title => Rc::clone(&self.title_handler),
            ControllerKind::Etc => Rc::clone(&self.etc_handler),
        };
        let listener = ControllerListener::new(
            Rc::clone(controller),
            self.ensure_override_listener(owner),
            handler,
        );
        self.controller_listeners
            .borrow_mut()
            .insert(controller.id(), Rc::clone(&listener));
        Ok(listener)
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("overrides", &self.override_listeners.borrow().len())
            .field("controllers", &self.controller_listeners.borrow().len())
            .field("listening", &self.listening_count())
            .finish_non_exhaustive()
    }
}
