//! Prioritized override stacks for document head metadata.
//!
//! Applications that render the same view several times, or nest route
//! components that each want a say in `<title>` and `<meta>`, push
//! [`Override`]s onto a [`Hairdresser`]. The newest override wins per
//! element; restoring it hands the element back to the previous one.
//!
//! - **[`Hairdresser`]**: Owns the active-controller registry and the
//!   observer list. Creates overrides and starts render sessions.
//!
//! - **[`Override`]**: A batch of controllers created and restored together.
//!   Builder API: [`title()`](Override::title), [`meta()`](Override::meta),
//!   [`link()`](Override::link), [`tag()`](Override::tag).
//!
//! - **[`Controller`]**: One override's claim on one element, linked with
//!   every other controller that targets the same selector.
//!
//! - **[`EventManager`]**: Listener coordination for a render session:
//!   keeps exactly the active controllers subscribed to their host
//!   [`EventSource`]s and drives [`EventHandler`] side effects.
//!
//! - **Render modes**: [`Hairdresser::render_to_string()`] for server-side
//!   markup and [`Hairdresser::render()`] for continuous rendering into any
//!   [`Document`] implementation.

pub mod controller;
pub mod engine;
pub mod error;
pub mod hairdresser;
pub mod listener;
pub mod model;
pub mod overrides;
pub mod render;
pub(crate) mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::{Controller, ControllerKind, ControllerOptions, Render, RenderFn};
pub use engine::{EventHandler, EventManager, RenderSession};
pub use error::HeadError;
pub use hairdresser::{Hairdresser, Observer};
pub use listener::{EventSource, Listener, ListenerOptions, ListenerToken, Signal};
pub use model::{AttrMap, AttrSet, ControllerId, ObserverId, OverrideId, to_html, to_selector};
pub use overrides::{Override, OverrideRef};
pub use render::dom::{Document, RenderTarget};
