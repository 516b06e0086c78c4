//! Shared fixtures for the core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use hairdresser_core::{Controller, ControllerKind, Document, EventHandler, HeadError, to_html};

// ── Recording handler ───────────────────────────────────────────────

/// Logs every handler call as `update <selector> <value>` / `stop <selector> <value>`.
#[derive(Default)]
pub struct Recorder {
    log: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<String> {
        self.log.take()
    }
}

fn describe(controller: &Controller) -> Result<String, HeadError> {
    Ok(match controller.kind() {
        ControllerKind::Title => controller.render_title()?,
        ControllerKind::Etc => to_html(controller.render_attrs()?),
    })
}

impl EventHandler for Recorder {
    fn on_update(&self, controller: &Controller) -> Result<(), HeadError> {
        let value = describe(controller)?;
        self.log
            .borrow_mut()
            .push(format!("update {} {value}", controller.selector()));
        Ok(())
    }

    fn on_stop(&self, controller: &Controller) -> Result<(), HeadError> {
        let value = describe(controller).unwrap_or_else(|_| controller.render().to_string());
        self.log
            .borrow_mut()
            .push(format!("stop {} {value}", controller.selector()));
        Ok(())
    }
}

// ── In-memory document ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Tiny arena-backed DOM: `<html>` with `<head>` and `<body>`.
///
/// Selectors support `tag[name='value']...` only, which is all the
/// renderer emits.
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<NodeData>>,
    title: RefCell<String>,
    head: Option<usize>,
}

pub const HTML: usize = 0;
pub const HEAD: usize = 1;
pub const BODY: usize = 2;

impl MemoryDocument {
    pub fn new(title: &str) -> Rc<Self> {
        let doc = Self {
            nodes: RefCell::new(vec![NodeData {
                tag: "html".into(),
                ..NodeData::default()
            }]),
            title: RefCell::new(title.to_owned()),
            head: Some(HEAD),
        };
        doc.insert(HTML, "head", &[]);
        doc.insert(HTML, "body", &[]);
        Rc::new(doc)
    }

    pub fn without_head() -> Rc<Self> {
        Rc::new(Self {
            nodes: RefCell::new(vec![NodeData {
                tag: "html".into(),
                ..NodeData::default()
            }]),
            title: RefCell::new(String::new()),
            head: None,
        })
    }

    /// Append a new element under `parent`.
    pub fn insert(&self, parent: usize, tag: &str, attrs: &[(&str, &str)]) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(NodeData {
            tag: tag.to_owned(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            parent: Some(parent),
            children: Vec::new(),
        });
        nodes[parent].children.push(id);
        id
    }

    /// Children of `parent` rendered as `<tag k="v">`, attributes in insertion order.
    pub fn markup(&self, parent: usize) -> String {
        let nodes = self.nodes.borrow();
        nodes[parent]
            .children
            .iter()
            .map(|&child| {
                let node = &nodes[child];
                let attrs: String = node
                    .attrs
                    .iter()
                    .map(|(k, v)| format!(" {k}=\"{v}\""))
                    .collect();
                format!("<{}{attrs}>", node.tag)
            })
            .collect()
    }

    pub fn children(&self, parent: usize) -> Vec<usize> {
        self.nodes.borrow()[parent].children.clone()
    }

    fn matches(&self, node: usize, selector: &str) -> bool {
        let (tag, rest) = selector.split_once('[').unwrap_or((selector, ""));
        let nodes = self.nodes.borrow();
        let data = &nodes[node];
        if data.tag != tag {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        format!("[{rest}")
            .split(']')
            .filter(|part| !part.is_empty())
            .all(|part| {
                let (name, value) = part.trim_start_matches('[').split_once('=').unwrap();
                let value = value.trim_matches('\'');
                data.attrs.iter().any(|(k, v)| k == name && v == value)
            })
    }

    fn descendants(&self, scope: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = self.children(scope);
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = self.children(node);
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

impl Document for MemoryDocument {
    type Node = usize;

    fn head(&self) -> Option<usize> {
        self.head
    }

    fn query_selector(&self, scope: Option<&usize>, selector: &str) -> Option<usize> {
        let mut candidates = Vec::new();
        if scope.is_none() {
            candidates.push(HTML);
        }
        candidates.extend(self.descendants(scope.copied().unwrap_or(HTML)));
        candidates.into_iter().find(|&node| self.matches(node, selector))
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_owned();
    }

    fn create_element(&self, tag_name: &str) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag_name.to_owned(),
            ..NodeData::default()
        });
        nodes.len() - 1
    }

    fn get_attribute(&self, node: &usize, name: &str) -> Option<String> {
        self.nodes.borrow()[*node]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, node: &usize, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let attrs = &mut nodes[*node].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_owned(),
            None => attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    fn remove_attribute(&self, node: &usize, name: &str) {
        self.nodes.borrow_mut()[*node].attrs.retain(|(k, _)| k != name);
    }

    fn attribute_names(&self, node: &usize) -> Vec<String> {
        self.nodes.borrow()[*node]
            .attrs
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn parent(&self, node: &usize) -> Option<usize> {
        self.nodes.borrow()[*node].parent
    }

    fn append_child(&self, parent: &usize, child: &usize) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[*child].parent = Some(*parent);
        nodes[*parent].children.push(*child);
    }

    fn remove_child(&self, parent: &usize, child: &usize) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[*parent].children.retain(|c| c != child);
        nodes[*child].parent = None;
    }
}
