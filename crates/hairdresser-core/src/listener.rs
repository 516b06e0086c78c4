// ── Host event sources ──
//
// The core never decides *when* something changed. Hosts (a reactive
// store, a router, a framework's change detection) hand in an
// `EventSource`; the engine subscribes while a controller is live and
// unsubscribes when it is replaced or restored.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::HeadError;

/// Callback the engine installs on a host event source.
pub type Listener = Rc<dyn Fn()>;

type AddListenerFn = Rc<dyn Fn(Listener) -> ListenerToken>;
type RemoveListenerFn = Rc<dyn Fn(&Listener, ListenerToken)>;

/// Opaque value returned by [`EventSource::add_listener`] and handed back
/// verbatim to [`EventSource::remove_listener`].
pub struct ListenerToken(Box<dyn Any>);

impl ListenerToken {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// A token for sources that identify listeners by pointer alone.
    pub fn empty() -> Self {
        Self::new(())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.downcast().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ListenerToken(..)")
    }
}

/// Subscribe/unsubscribe capability supplied by the host.
pub trait EventSource {
    fn add_listener(&self, listener: Listener) -> ListenerToken;

    fn remove_listener(&self, listener: &Listener, token: ListenerToken);
}

/// Listener wiring for an override or a controller.
///
/// Either wraps an [`EventSource`] or a raw add/remove closure pair. An add
/// closure without a matching remove closure is rejected when the options
/// are used.
#[derive(Clone, Default)]
pub struct ListenerOptions {
    add: Option<AddListenerFn>,
    remove: Option<RemoveListenerFn>,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source<S: EventSource + ?Sized + 'static>(source: Rc<S>) -> Self {
        let adder = Rc::clone(&source);
        Self {
            add: Some(Rc::new(move |listener| adder.add_listener(listener))),
            remove: Some(Rc::new(move |listener, token| {
                source.remove_listener(listener, token);
            })),
        }
    }

    #[must_use]
    pub fn add_listener(mut self, add: impl Fn(Listener) -> ListenerToken + 'static) -> Self {
        self.add = Some(Rc::new(add));
        self
    }

    #[must_use]
    pub fn remove_listener(mut self, remove: impl Fn(&Listener, ListenerToken) + 'static) -> Self {
        self.remove = Some(Rc::new(remove));
        self
    }

    /// Validate the pairing and collapse into a single source.
    pub(crate) fn into_source(self) -> Result<Option<Rc<dyn EventSource>>, HeadError> {
        match (self.add, self.remove) {
            (Some(add), Some(remove)) => Ok(Some(Rc::new(CallbackSource { add, remove }))),
            (Some(_), None) => Err(HeadError::invalid_argument(
                "addListener requires removeListener",
            )),
            (None, _) => Ok(None),
        }
    }
}

impl fmt::Debug for ListenerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("add", &self.add.is_some())
            .field("remove", &self.remove.is_some())
            .finish()
    }
}

struct CallbackSource {
    add: AddListenerFn,
    remove: RemoveListenerFn,
}

impl EventSource for CallbackSource {
    fn add_listener(&self, listener: Listener) -> ListenerToken {
        (self.add)(listener)
    }

    fn remove_listener(&self, listener: &Listener, token: ListenerToken) {
        (self.remove)(listener, token);
    }
}

// ── Signal ───────────────────────────────────────────────────────────

/// Minimal single-threaded event source.
///
/// Hosts without their own notification mechanism can hold a `Signal`,
/// pass it to [`ListenerOptions::from_source`] and call [`emit`](Self::emit)
/// whenever the data behind a render function changes.
#[derive(Default)]
pub struct Signal {
    listeners: RefCell<Vec<(u64, Listener)>>,
    last_key: Cell<u64>,
}

impl Signal {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Invoke every subscribed listener.
    ///
    /// The listener list is copied first, so listeners may subscribe or
    /// unsubscribe while the signal is being emitted.
    pub fn emit(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl EventSource for Signal {
    fn add_listener(&self, listener: Listener) -> ListenerToken {
        let key = self.last_key.get() + 1;
        self.last_key.set(key);
        self.listeners.borrow_mut().push((key, listener));
        ListenerToken::new(key)
    }

    fn remove_listener(&self, _listener: &Listener, token: ListenerToken) {
        if let Some(key) = token.downcast::<u64>() {
            self.listeners.borrow_mut().retain(|(k, _)| *k != key);
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn add_without_remove_is_rejected() {
        let options = ListenerOptions::new().add_listener(|_| ListenerToken::empty());
        let err = options.into_source().err().unwrap();
        assert!(matches!(err, HeadError::InvalidArgument { .. }));
        assert!(err.to_string().contains("addListener requires removeListener"));
    }

    #[test]
    fn remove_alone_resolves_to_no_source() {
        let options = ListenerOptions::new().remove_listener(|_, _| {});
        assert!(options.into_source().unwrap().is_none());
    }

    #[test]
    fn signal_emits_until_removed() {
        let signal = Signal::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let listener: Listener = Rc::new(move || counter.set(counter.get() + 1));

        let token = signal.add_listener(Rc::clone(&listener));
        signal.emit();
        signal.emit();
        assert_eq!(hits.get(), 2);

        signal.remove_listener(&listener, token);
        signal.emit();
        assert_eq!(hits.get(), 2);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn token_round_trips_its_payload() {
        let token = ListenerToken::new(String::from("sub-1"));
        assert_eq!(token.downcast_ref::<String>().map(String::as_str), Some("sub-1"));
        assert_eq!(token.downcast::<String>().as_deref(), Some("sub-1"));
    }

    #[test]
    fn options_from_source_forward_to_the_source() {
        let signal = Signal::new();
        let source = ListenerOptions::from_source(Rc::clone(&signal))
            .into_source()
            .unwrap()
            .unwrap();

        let listener: Listener = Rc::new(|| {});
        let token = source.add_listener(Rc::clone(&listener));
        assert_eq!(signal.listener_count(), 1);
        source.remove_listener(&listener, token);
        assert_eq!(signal.listener_count(), 0);
    }
}
