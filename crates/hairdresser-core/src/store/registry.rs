// ── Active-controller registry ──
//
// Maps each selector to the controller currently authoritative for it.
// Backed by a `BTreeMap` so iteration is always selector-sorted, which
// keeps render output deterministic.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::controller::Controller;

#[derive(Default)]
pub(crate) struct ActiveRegistry {
    by_selector: BTreeMap<String, Rc<Controller>>,
}

impl ActiveRegistry {
    pub(crate) fn get(&self, selector: &str) -> Option<Rc<Controller>> {
        self.by_selector.get(selector).map(Rc::clone)
    }

    /// Whether `controller` is the current entry for its selector.
    pub(crate) fn is_active(&self, controller: &Controller) -> bool {
        self.by_selector
            .get(controller.selector())
            .is_some_and(|top| std::ptr::eq(Rc::as_ptr(top), controller))
    }

    /// Link `controller` after the current entry for its selector and make it
    /// the new entry.
    pub(crate) fn push(&mut self, controller: &Rc<Controller>) {
        if let Some(top) = self.by_selector.get(controller.selector()) {
            top.insert_after(controller);
        }
        self.by_selector
            .insert(controller.selector().to_owned(), Rc::clone(controller));
    }

    /// Unlink `controller`. When it was the entry for its selector, its
    /// predecessor takes over, or the slot is cleared.
    pub(crate) fn release(&mut self, controller: &Controller) {
        if self.is_active(controller) {
            match controller.prev() {
                Some(prev) => {
                    self.by_selector.insert(controller.selector().to_owned(), prev);
                }
                None => {
                    self.by_selector.remove(controller.selector());
                }
            }
        }
        controller.unlink();
    }

    /// Active controllers in selector order.
    pub(crate) fn snapshot(&self) -> Vec<Rc<Controller>> {
        self.by_selector.values().map(Rc::clone).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_selector.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}
