// ── Controllers ──
//
// A controller is one override's claim on one head element. Controllers
// that target the same selector form a doubly linked chain in insertion
// order; the tail of the live chain is the one that renders.
//
// Links are asymmetric: `prev` is strong and `next` is weak. The registry
// holds the tail, so every live predecessor stays reachable without
// reference cycles.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::HeadError;
use crate::listener::{EventSource, ListenerOptions};
use crate::model::{AttrMap, AttrSet, ControllerId, OverrideId, attrs_from_value};
use crate::overrides::OverrideRef;

/// Zero-argument render function producing a dynamic value.
pub type RenderFn = Rc<dyn Fn() -> Value>;

// ── ControllerKind ───────────────────────────────────────────────────

/// What a controller renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    /// The document title. Render values must be strings.
    Title,
    /// Any other element. Render values must be attribute objects.
    Etc,
}

impl ControllerKind {
    /// Check a render value against this kind's contract.
    pub fn validate(self, tag_name: &str, value: &Value) -> Result<(), HeadError> {
        match self {
            Self::Title if value.is_string() => Ok(()),
            Self::Title => Err(not_a_string(tag_name)),
            Self::Etc => attrs_from_value(tag_name, value).map(|_| ()),
        }
    }
}

fn not_a_string(tag_name: &str) -> HeadError {
    HeadError::validation(format!("render value for <{tag_name}> must be a string"))
}

// ── Render ───────────────────────────────────────────────────────────

/// A literal render value or a function producing one.
///
/// Literals are validated when the controller is added; functions are
/// validated every time they are rendered.
#[derive(Clone)]
pub enum Render {
    Value(Value),
    Func(RenderFn),
}

impl Render {
    pub fn func(render: impl Fn() -> Value + 'static) -> Self {
        Self::Func(Rc::new(render))
    }
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<Value> for Render {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Render {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_owned()))
    }
}

impl From<String> for Render {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<AttrMap> for Render {
    fn from(attrs: AttrMap) -> Self {
        Self::Value(attrs_to_value(attrs))
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Render
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<AttrMap>(),
        )
    }
}

impl From<RenderFn> for Render {
    fn from(render: RenderFn) -> Self {
        Self::Func(render)
    }
}

fn attrs_to_value(attrs: AttrMap) -> Value {
    Value::Object(
        attrs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

// ── ControllerOptions ────────────────────────────────────────────────

/// Per-controller options: a finer-grained event source and closing-tag emission.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    listener: ListenerOptions,
    close: bool,
}

impl ControllerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn listener(mut self, listener: ListenerOptions) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn source<S: EventSource + ?Sized + 'static>(self, source: Rc<S>) -> Self {
        self.listener(ListenerOptions::from_source(source))
    }

    /// Emit a closing tag when rendering to a string.
    #[must_use]
    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }
}

// ── Controller ───────────────────────────────────────────────────────

pub struct Controller {
    id: Cell<ControllerId>,
    owner: OnceCell<OverrideRef>,

    kind: ControllerKind,
    tag_name: String,
    attrs: AttrSet,
    selector: String,

    render: RenderFn,
    source: Option<Rc<dyn EventSource>>,
    needs_to_close: bool,

    prev: RefCell<Option<Rc<Controller>>>,
    next: RefCell<Weak<Controller>>,
}

impl Controller {
    /// Create an unregistered controller.
    ///
    /// Fails with [`HeadError::InvalidArgument`] when the options carry an
    /// add-listener without a remove-listener.
    pub fn new(
        kind: ControllerKind,
        tag_name: impl Into<String>,
        attrs: AttrSet,
        render: RenderFn,
        options: ControllerOptions,
    ) -> Result<Self, HeadError> {
        let source = options.listener.into_source()?;
        let tag_name = tag_name.into();
        let selector = format!("{tag_name}{}", attrs.selector());

        Ok(Self {
            id: Cell::new(ControllerId::UNASSIGNED),
            owner: OnceCell::new(),
            kind,
            tag_name,
            attrs,
            selector,
            render,
            source,
            needs_to_close: options.close,
            prev: RefCell::new(None),
            next: RefCell::new(Weak::new()),
        })
    }

    /// Attach the id and owning override. A controller is registered once.
    pub(crate) fn bind(&self, id: ControllerId, owner: OverrideRef) -> Result<(), HeadError> {
        self.owner
            .set(owner)
            .map_err(|_| {
                HeadError::invariant(format!(
                    "controller for '{}' is already registered as {}",
                    self.selector,
                    self.id()
                ))
            })?;
        self.id.set(id);
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> ControllerId {
        self.id.get()
    }

    pub fn owner(&self) -> Option<&OverrideRef> {
        self.owner.get()
    }

    pub fn override_id(&self) -> Option<OverrideId> {
        self.owner().map(OverrideRef::id)
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn needs_to_close(&self) -> bool {
        self.needs_to_close
    }

    pub(crate) fn source(&self) -> Option<&Rc<dyn EventSource>> {
        self.source.as_ref()
    }

    pub fn has_listener(&self) -> bool {
        self.source.is_some()
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Raw, unvalidated render value.
    pub fn render(&self) -> Value {
        (self.render)()
    }

    /// Render and validate as a title string.
    pub fn render_title(&self) -> Result<String, HeadError> {
        match self.render() {
            Value::String(title) => Ok(title),
            _ => Err(not_a_string(&self.tag_name)),
        }
    }

    /// Render and validate as an attribute object.
    pub fn render_attrs(&self) -> Result<AttrMap, HeadError> {
        attrs_from_value(&self.tag_name, &self.render())
    }

    // ── Chain ────────────────────────────────────────────────────────

    pub fn prev(&self) -> Option<Rc<Controller>> {
        self.prev.borrow().clone()
    }

    pub fn next(&self) -> Option<Rc<Controller>> {
        self.next.borrow().upgrade()
    }

    /// Nearest predecessor owned by a different override.
    ///
    /// This is the controller that takes over when this one's override is
    /// restored.
    pub fn fallback(&self) -> Option<Rc<Controller>> {
        let owner = self.override_id();
        let mut cursor = self.prev();
        while let Some(node) = cursor {
            if node.override_id() != owner {
                return Some(node);
            }
            cursor = node.prev();
        }
        None
    }

    /// Whether this controller has neighbours in its selector chain.
    pub fn is_linked(&self) -> bool {
        self.prev.borrow().is_some() || self.next.borrow().strong_count() > 0
    }

    /// Splice `node` into the chain directly after `self`.
    pub fn insert_after(self: &Rc<Self>, node: &Rc<Controller>) {
        let after = self.next();
        link(Some(node), after.as_ref());
        link(Some(self), Some(node));
    }

    /// Remove `self` from its chain, reconnecting its neighbours.
    pub fn unlink(&self) {
        let prev = self.prev.borrow_mut().take();
        let next = std::mem::take(&mut *self.next.borrow_mut()).upgrade();
        link(prev.as_ref(), next.as_ref());
    }
}

fn link(prev: Option<&Rc<Controller>>, next: Option<&Rc<Controller>>) {
    if let Some(prev) = prev {
        *prev.next.borrow_mut() = next.map_or_else(Weak::new, Rc::downgrade);
    }
    if let Some(next) = next {
        *next.prev.borrow_mut() = prev.cloned();
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id())
            .field("override", &self.override_id())
            .field("kind", &self.kind)
            .field("selector", &self.selector)
            .field("needs_to_close", &self.needs_to_close)
            .field("has_listener", &self.has_listener())
            .finish_non_exhaustive()
    }
}
