// ── Render sessions ──

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::EventManager;
use crate::controller::Controller;
use crate::error::HeadError;
use crate::hairdresser::{Hairdresser, Observer};
use crate::model::ObserverId;
use crate::overrides::OverrideRef;

/// Keeps a session's `EventManager` in step with the hairdresser.
struct SessionObserver {
    manager: Rc<EventManager>,
}

impl Observer for SessionObserver {
    fn on_add_controller(&self, controller: &Rc<Controller>) -> Result<(), HeadError> {
        if let Some(prev) = controller.prev() {
            if self.manager.is_controller_listening(&prev) {
                self.manager.stop_listening_controller(&prev)?;
            }
        }
        self.manager.start_listening_controller(controller)
    }

    fn on_update(&self, owner: &OverrideRef) -> Result<(), HeadError> {
        self.manager.update_override(owner)
    }

    fn on_pre_remove_override(
        &self,
        owner: &OverrideRef,
        controllers: &[Rc<Controller>],
    ) -> Result<(), HeadError> {
        // Every hand-over runs even when a handler fails; the first error wins.
        let mut first_error = None;
        for controller in controllers {
            if self.manager.is_controller_listening(controller) {
                if let Err(err) = self.manager.stop_listening_controller(controller) {
                    first_error.get_or_insert(err);
                }
                if let Some(fallback) = controller.fallback() {
                    if let Err(err) = self.manager.start_listening_controller(&fallback) {
                        first_error.get_or_insert(err);
                    }
                }
            }
            if let Err(err) = self.manager.remove_controller(controller) {
                first_error.get_or_insert(err);
            }
        }
        if let Err(err) = self.manager.remove_override(owner) {
            first_error.get_or_insert(err);
        }
        first_error.map_or(Ok(()), Err)
    }

    fn on_abort_controller(&self, controller: &Rc<Controller>) -> Result<(), HeadError> {
        let stopped = if self.manager.is_controller_listening(controller) {
            self.manager.stop_listening_controller(controller)
        } else {
            Ok(())
        };
        let removed = self.manager.remove_controller(controller);
        let restarted = match controller.prev() {
            Some(prev) if !self.manager.is_controller_listening(&prev) => {
                self.manager.start_listening_controller(&prev)
            }
            _ => Ok(()),
        };
        stopped.and(removed).and(restarted)
    }
}

/// A running [`Hairdresser::render_and_listen`] session.
///
/// Dropping the session does not end it; call [`stop`](Self::stop).
#[must_use = "a render session keeps listening until stop() is called"]
pub struct RenderSession {
    hairdresser: Hairdresser,
    observer_id: ObserverId,
    manager: Rc<EventManager>,
    stopped: Cell<bool>,
}

impl RenderSession {
    pub(crate) fn start(hairdresser: Hairdresser, manager: Rc<EventManager>) -> Self {
        let observer = Rc::new(SessionObserver {
            manager: Rc::clone(&manager),
        });
        let observer_id = hairdresser.add_observer(observer);
        Self {
            hairdresser,
            observer_id,
            manager,
            stopped: Cell::new(false),
        }
    }

    /// Stop following the hairdresser and run every stop handler.
    ///
    /// Calling `stop` again does nothing.
    pub fn stop(&self) -> Result<(), HeadError> {
        if self.stopped.replace(true) {
            return Ok(());
        }
        self.hairdresser.remove_observer(self.observer_id);
        debug!(observer = %self.observer_id, "render session stopped");
        self.manager.destroy()
    }

    pub fn is_active(&self) -> bool {
        !self.stopped.get()
    }

    pub fn manager(&self) -> &EventManager {
        &self.manager
    }
}

impl fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("observer", &self.observer_id)
            .field("active", &self.is_active())
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
