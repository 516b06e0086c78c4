// ── Continuous DOM rendering ──
//
// The core does not link against any browser binding. Hosts implement
// `Document` over whatever tree they have (web-sys, a headless DOM, an
// in-memory test double) and `Hairdresser::render` keeps it in sync.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::controller::{Controller, ControllerKind};
use crate::engine::{EventHandler, RenderSession};
use crate::error::HeadError;
use crate::hairdresser::Hairdresser;
use crate::model::{AttrSet, ControllerId};

/// Minimal document capability needed for continuous rendering.
///
/// Methods take `&self`; implementations use interior mutability.
pub trait Document {
    type Node: Clone + PartialEq + 'static;

    /// The `<head>` element, if the document has one.
    fn head(&self) -> Option<Self::Node>;

    /// First element matching a CSS selector, searching below `scope` or
    /// the whole document when `scope` is `None`.
    fn query_selector(&self, scope: Option<&Self::Node>, selector: &str) -> Option<Self::Node>;

    fn title(&self) -> String;
    fn set_title(&self, title: &str);

    fn create_element(&self, tag_name: &str) -> Self::Node;
    fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);
    fn attribute_names(&self, node: &Self::Node) -> Vec<String>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);
}

/// Where rendered elements live.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTarget<N> {
    /// The document's `<head>`.
    Head,
    /// The first element matching a selector.
    Selector(String),
    /// An element the caller already holds.
    Element(N),
}

/// How the renderer came to own the element for a selector.
enum Origin {
    Created,
    /// Found in the document; holds the attributes it had before rendering.
    Existing(Vec<(String, String)>),
}

struct DomRenderer<D: Document> {
    document: Rc<D>,
    root: D::Node,
    initial_title: String,
    cache: RefCell<HashMap<ControllerId, D::Node>>,
    origins: RefCell<HashMap<String, Origin>>,
}

impl<D: Document> DomRenderer<D> {
    fn new(document: Rc<D>, root: D::Node) -> Self {
        let initial_title = document.title();
        Self {
            document,
            root,
            initial_title,
            cache: RefCell::new(HashMap::new()),
            origins: RefCell::new(HashMap::new()),
        }
    }

    fn is_cache_valid(&self, node: &D::Node, attrs: &AttrSet) -> bool {
        if self.document.parent(node).as_ref() != Some(&self.root) {
            return false;
        }
        attrs.each(|name, value| {
            self.document.get_attribute(node, name).as_deref() == Some(value)
        })
    }

    /// The cached element for `controller`, dropping it when stale.
    fn cached_element(&self, controller: &Controller) -> Option<D::Node> {
        let node = self.cache.borrow().get(&controller.id()).cloned()?;
        if self.is_cache_valid(&node, controller.attrs()) {
            return Some(node);
        }
        self.cache.borrow_mut().remove(&controller.id());
        None
    }

    fn ensure_element(&self, controller: &Controller) -> D::Node {
        if let Some(node) = self.cached_element(controller) {
            return node;
        }

        let node = if let Some(found) = self
            .document
            .query_selector(Some(&self.root), controller.selector())
        {
            self.origins
                .borrow_mut()
                .entry(controller.selector().to_owned())
                .or_insert_with(|| Origin::Existing(self.snapshot_attributes(&found)));
            found
        } else {
            let created = self.document.create_element(controller.tag_name());
            controller.attrs().each(|name, value| {
                self.document.set_attribute(&created, name, value);
                true
            });
            self.document.append_child(&self.root, &created);
            self.origins
                .borrow_mut()
                .entry(controller.selector().to_owned())
                .or_insert(Origin::Created);
            trace!(selector = controller.selector(), "element created");
            created
        };

        self.cache
            .borrow_mut()
            .insert(controller.id(), node.clone());
        node
    }

    fn snapshot_attributes(&self, node: &D::Node) -> Vec<(String, String)> {
        self.document
            .attribute_names(node)
            .into_iter()
            .filter_map(|name| {
                let value = self.document.get_attribute(node, &name)?;
                Some((name, value))
            })
            .collect()
    }

    /// Put a selector's element back the way the session found it.
    fn release_element(&self, controller: &Controller) {
        let node = self.cached_element(controller).or_else(|| {
            self.document
                .query_selector(Some(&self.root), controller.selector())
        });
        self.cache.borrow_mut().remove(&controller.id());
        let origin = self.origins.borrow_mut().remove(controller.selector());

        let Some(node) = node else {
            return;
        };
        match origin {
            Some(Origin::Existing(original)) => {
                for name in self.document.attribute_names(&node) {
                    if !original.iter().any(|(kept, _)| *kept == name) {
                        self.document.remove_attribute(&node, &name);
                    }
                }
                for (name, value) in &original {
                    self.document.set_attribute(&node, name, value);
                }
            }
            Some(Origin::Created) | None => {
                if let Some(parent) = self.document.parent(&node) {
                    self.document.remove_child(&parent, &node);
                }
            }
        }
    }
}

/// A controller is the last of its selector when nothing will render after it.
fn is_last_of_selector(controller: &Controller) -> bool {
    controller.next().is_none() && controller.fallback().is_none()
}

impl<D: Document> EventHandler for DomRenderer<D> {
    fn on_update(&self, controller: &Controller) -> Result<(), HeadError> {
        match controller.kind() {
            ControllerKind::Title => {
                let title = controller.render_title()?;
                self.document.set_title(&title);
            }
            ControllerKind::Etc => {
                let attrs = controller.render_attrs()?;
                let node = self.ensure_element(controller);
                for (name, value) in &attrs {
                    self.document.set_attribute(&node, name, value);
                }
            }
        }
        Ok(())
    }

    fn on_stop(&self, controller: &Controller) -> Result<(), HeadError> {
        if !is_last_of_selector(controller) {
            return Ok(());
        }
        match controller.kind() {
            ControllerKind::Title => self.document.set_title(&self.initial_title),
            ControllerKind::Etc => self.release_element(controller),
        }
        Ok(())
    }
}

impl Hairdresser {
    /// Render into `document` under `target` and keep it in sync.
    ///
    /// Fails with [`HeadError::Environment`] when the target element cannot
    /// be found. When the last controller of a selector stops, the title goes
    /// back to what it was when the session started, a created element is
    /// removed and a pre-existing element gets its original attributes back.
    pub fn render<D: Document + 'static>(
        &self,
        document: Rc<D>,
        target: RenderTarget<D::Node>,
    ) -> Result<RenderSession, HeadError> {
        let root = match target {
            RenderTarget::Head => document
                .head()
                .ok_or_else(|| HeadError::environment("document has no <head> element"))?,
            RenderTarget::Selector(selector) => {
                document.query_selector(None, &selector).ok_or_else(|| {
                    HeadError::environment(format!("no element matches '{selector}'"))
                })?
            }
            RenderTarget::Element(node) => node,
        };

        let renderer = Rc::new(DomRenderer::new(document, root));
        self.render_and_listen(renderer.clone(), renderer)
    }
}
