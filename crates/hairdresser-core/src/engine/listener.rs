// ── Per-override and per-controller listeners ──
//
// Both listener kinds hold at most one live subscription on a host
// `EventSource`. The callback handed to the host captures a `Weak` back
// reference, so a host that keeps a stale callback around can never keep
// the engine alive or re-render a detached controller.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::warn;

use super::EventHandler;
use crate::controller::Controller;
use crate::error::HeadError;
use crate::listener::{EventSource, Listener, ListenerToken};
use crate::model::ControllerId;
use crate::overrides::OverrideRef;

/// A live subscription: the callback and the token its source returned.
struct Subscription {
    source: Rc<dyn EventSource>,
    listener: Listener,
    token: ListenerToken,
}

impl Subscription {
    fn open(source: &Rc<dyn EventSource>, listener: Listener) -> Self {
        let token = source.add_listener(Rc::clone(&listener));
        Self {
            source: Rc::clone(source),
            listener,
            token,
        }
    }

    fn close(self) {
        self.source.remove_listener(&self.listener, self.token);
    }
}

// ── OverrideListener ─────────────────────────────────────────────────

/// Fans an override-level event out to every attached controller listener.
///
/// Subscribes when the first controller listener attaches and unsubscribes
/// when the last one detaches.
pub(crate) struct OverrideListener {
    owner: OverrideRef,
    attached: RefCell<Vec<(ControllerId, Weak<ControllerListener>)>>,
    subscription: RefCell<Option<Subscription>>,
}

impl OverrideListener {
    pub(crate) fn new(owner: OverrideRef) -> Rc<Self> {
        Rc::new(Self {
            owner,
            attached: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
        })
    }

    /// Re-render every attached controller. Stops at the first failure.
    pub(crate) fn update(&self) -> Result<(), HeadError> {
        for listener in self.attached_listeners() {
            listener.update()?;
        }
        Ok(())
    }

    fn attach(self: &Rc<Self>, listener: &Rc<ControllerListener>) {
        self.attached
            .borrow_mut()
            .push((listener.controller.id(), Rc::downgrade(listener)));

        let Some(source) = self.owner.source() else {
            return;
        };
        if self.subscription.borrow().is_some() {
            return;
        }

        let weak = Rc::downgrade(self);
        let callback: Listener = Rc::new(move || {
            if let Some(this) = weak.upgrade() {
                if let Err(err) = this.update() {
                    warn!(override_id = %this.owner.id(), error = %err, "override update failed");
                }
            }
        });
        let subscription = Subscription::open(source, callback);
        *self.subscription.borrow_mut() = Some(subscription);
    }

    fn detach(&self, id: ControllerId) {
        let now_empty = {
            let mut attached = self.attached.borrow_mut();
            attached.retain(|(entry, _)| *entry != id);
            attached.is_empty()
        };
        if now_empty {
            let subscription = self.subscription.borrow_mut().take();
            if let Some(subscription) = subscription {
                subscription.close();
            }
        }
    }

    pub(crate) fn is_ready_to_remove(&self) -> bool {
        self.subscription.borrow().is_none() && self.attached.borrow().is_empty()
    }

    fn attached_listeners(&self) -> Vec<Rc<ControllerListener>> {
        self.attached
            .borrow()
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }
}

// ── ControllerListener ───────────────────────────────────────────────

/// Drives one controller's handler and its optional controller-level source.
pub(crate) struct ControllerListener {
    controller: Rc<Controller>,
    override_listener: Rc<OverrideListener>,
    handler: Rc<dyn EventHandler>,
    listening: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
}

impl ControllerListener {
    pub(crate) fn new(
        controller: Rc<Controller>,
        override_listener: Rc<OverrideListener>,
        handler: Rc<dyn EventHandler>,
    ) -> Rc<Self> {
        Rc::new(Self {
            controller,
            override_listener,
            handler,
            listening: Cell::new(false),
            subscription: RefCell::new(None),
        })
    }

    pub(crate) fn update(&self) -> Result<(), HeadError> {
        self.handler.on_update(&self.controller)
    }

    pub(crate) fn stop(&self) -> Result<(), HeadError> {
        self.handler.on_stop(&self.controller)
    }

    pub(crate) fn start_listening(self: &Rc<Self>) {
        self.override_listener.attach(self);

        if let Some(source) = self.controller.source() {
            let weak = Rc::downgrade(self);
            let callback: Listener = Rc::new(move || {
                if let Some(this) = weak.upgrade() {
                    if let Err(err) = this.update() {
                        warn!(
                            controller = %this.controller.id(),
                            error = %err,
                            "controller update failed"
                        );
                    }
                }
            });
            let subscription = Subscription::open(source, callback);
            *self.subscription.borrow_mut() = Some(subscription);
        }
        self.listening.set(true);
    }

    pub(crate) fn stop_listening(&self) {
        self.override_listener.detach(self.controller.id());

        let subscription = self.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.close();
        }
        self.listening.set(false);
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.get()
    }
}
