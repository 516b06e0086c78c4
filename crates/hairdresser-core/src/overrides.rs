// ── Overrides ──
//
// An override is the unit of stacking: a batch of controllers created
// together and restored together. Adding a controller makes it the active
// one for its selector immediately; restoring the override hands every
// selector back to whatever was underneath.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::controller::{Controller, ControllerKind, ControllerOptions, Render, RenderFn};
use crate::error::HeadError;
use crate::hairdresser::Hairdresser;
use crate::listener::EventSource;
use crate::model::{AttrSet, OverrideId};

// ── OverrideRef ──────────────────────────────────────────────────────

/// The part of an override that its controllers and the listener engine
/// need: identity plus the optional override-level event source.
#[derive(Clone)]
pub struct OverrideRef {
    id: OverrideId,
    source: Option<Rc<dyn EventSource>>,
}

impl OverrideRef {
    pub fn id(&self) -> OverrideId {
        self.id
    }

    pub fn has_listener(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn source(&self) -> Option<&Rc<dyn EventSource>> {
        self.source.as_ref()
    }
}

impl fmt::Debug for OverrideRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideRef")
            .field("id", &self.id)
            .field("has_listener", &self.has_listener())
            .finish()
    }
}

// ── Override ─────────────────────────────────────────────────────────

/// A named batch of controllers.
///
/// Builder methods return `Result<&Self, _>` so calls chain with `?`:
///
/// ```
/// # use hairdresser_core::Hairdresser;
/// # fn main() -> Result<(), hairdresser_core::HeadError> {
/// let hairdresser = Hairdresser::new();
/// hairdresser
///     .new_override()
///     .title("Hello")?
///     .meta([("name", "twitter:title")], [("content", "Hello")])?;
///
/// assert_eq!(
///     hairdresser.render_to_string()?,
///     r#"<meta name="twitter:title" content="Hello"><title>Hello</title>"#
/// );
/// # Ok(())
/// # }
/// ```
pub struct Override {
    owner: OverrideRef,
    hairdresser: Hairdresser,
    controllers: RefCell<Vec<Rc<Controller>>>,
}

impl Override {
    pub(crate) fn new(
        hairdresser: Hairdresser,
        id: OverrideId,
        source: Option<Rc<dyn EventSource>>,
    ) -> Self {
        Self {
            owner: OverrideRef { id, source },
            hairdresser,
            controllers: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> OverrideId {
        self.owner.id
    }

    pub fn owner(&self) -> &OverrideRef {
        &self.owner
    }

    /// Controllers owned by this override, in insertion order.
    pub fn controllers(&self) -> Vec<Rc<Controller>> {
        self.controllers.borrow().clone()
    }

    // ── Builder ──────────────────────────────────────────────────────

    /// Override the document `<title>`.
    pub fn title(&self, render: impl Into<Render>) -> Result<&Self, HeadError> {
        self.title_with(render, ControllerOptions::new())
    }

    pub fn title_with(
        &self,
        render: impl Into<Render>,
        options: ControllerOptions,
    ) -> Result<&Self, HeadError> {
        self.add_controller(
            ControllerKind::Title,
            "title",
            AttrSet::default(),
            render.into(),
            options,
        )
    }

    /// Override the element `<tag_name>` identified by `attrs`.
    pub fn tag<I, K, V>(
        &self,
        tag_name: &str,
        attrs: I,
        render: impl Into<Render>,
    ) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tag_with(tag_name, attrs, render, ControllerOptions::new())
    }

    pub fn tag_with<I, K, V>(
        &self,
        tag_name: &str,
        attrs: I,
        render: impl Into<Render>,
        options: ControllerOptions,
    ) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.add_controller(
            ControllerKind::Etc,
            tag_name,
            AttrSet::new(attrs),
            render.into(),
            options,
        )
    }

    pub fn meta<I, K, V>(&self, attrs: I, render: impl Into<Render>) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tag("meta", attrs, render)
    }

    pub fn meta_with<I, K, V>(
        &self,
        attrs: I,
        render: impl Into<Render>,
        options: ControllerOptions,
    ) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tag_with("meta", attrs, render, options)
    }

    pub fn link<I, K, V>(&self, attrs: I, render: impl Into<Render>) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tag("link", attrs, render)
    }

    pub fn link_with<I, K, V>(
        &self,
        attrs: I,
        render: impl Into<Render>,
        options: ControllerOptions,
    ) -> Result<&Self, HeadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tag_with("link", attrs, render, options)
    }

    /// The primitive behind every builder method.
    ///
    /// Literal values are validated here, before anything is registered;
    /// functions are validated each time they render. When a render session
    /// fails to render the new controller, its registration is undone and
    /// the session's error is returned.
    pub fn add_controller(
        &self,
        kind: ControllerKind,
        tag_name: &str,
        attrs: AttrSet,
        render: Render,
        options: ControllerOptions,
    ) -> Result<&Self, HeadError> {
        let render: RenderFn = match render {
            Render::Value(value) => {
                kind.validate(tag_name, &value)?;
                Rc::new(move || value.clone())
            }
            Render::Func(render) => render,
        };

        let controller = Rc::new(Controller::new(kind, tag_name, attrs, render, options)?);
        self.hairdresser
            .register_controller(&self.owner, Rc::clone(&controller))?;
        self.controllers.borrow_mut().push(controller);
        Ok(self)
    }

    /// This override's most recently added controller for the selector.
    ///
    /// Only looks at controllers owned by this override, never the global chain.
    pub fn get_controller<I, K, V>(&self, tag_name: &str, attrs: I) -> Option<Rc<Controller>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let selector = format!("{tag_name}{}", crate::model::to_selector(attrs));
        self.controllers
            .borrow()
            .iter()
            .rev()
            .find(|controller| controller.selector() == selector)
            .map(Rc::clone)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Re-render this override's listening controllers.
    ///
    /// A no-op when no render session is listening to it.
    pub fn update(&self) -> Result<(), HeadError> {
        self.hairdresser.notify_update(&self.owner)
    }

    /// Remove every controller of this override.
    ///
    /// Render sessions are told first so they can hand each element over to
    /// the previous controller. Afterwards the controllers are unlinked and
    /// the registry falls back to their predecessors. Restoring twice is a
    /// no-op the second time.
    ///
    /// The controllers are released even when a session handler fails; the
    /// first handler error is returned afterwards.
    pub fn restore(&self) -> Result<(), HeadError> {
        let controllers = self.controllers();
        let notified = self.hairdresser.notify_pre_remove(&self.owner, &controllers);

        self.controllers.borrow_mut().clear();
        self.hairdresser.release_controllers(&controllers);
        debug!(
            override_id = %self.owner.id,
            released = controllers.len(),
            "override restored"
        );
        notified
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Override")
            .field("id", &self.owner.id)
            .field("has_listener", &self.owner.has_listener())
            .field("controllers", &self.controllers.borrow().len())
            .finish_non_exhaustive()
    }
}
