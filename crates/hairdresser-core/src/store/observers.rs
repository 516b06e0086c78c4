// ── Observer list ──
//
// Subscribers notified about controller insertion, override updates and
// imminent override removal. Each render session registers one entry.

use std::rc::Rc;

use crate::hairdresser::Observer;
use crate::model::{IdGenerator, ObserverId};

#[derive(Default)]
pub(crate) struct ObserverList {
    ids: IdGenerator,
    entries: Vec<(ObserverId, Rc<dyn Observer>)>,
}

impl ObserverList {
    pub(crate) fn add(&mut self, observer: Rc<dyn Observer>) -> ObserverId {
        let id = self.ids.next();
        self.entries.push((id, observer));
        id
    }

    /// Returns `true` if the observer was registered.
    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Copy of the current observers, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn Observer>> {
        self.entries
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
