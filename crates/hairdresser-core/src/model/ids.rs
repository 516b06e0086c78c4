// ── Identity types ──
//
// Controllers, overrides and observers are identified by small integers
// handed out by the owning `Hairdresser`. Each instance counts on its own,
// so two hairdressers never share state through their ids.

use std::cell::Cell;
use std::fmt;

use serde::Serialize;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a registered [`Controller`](crate::Controller).
    ///
    /// `0` ([`ControllerId::UNASSIGNED`]) marks a controller that has not been
    /// added to an override yet.
    ControllerId,
    "controller"
);

id_type!(
    /// Identifier of an [`Override`](crate::Override).
    OverrideId,
    "override"
);

id_type!(
    /// Handle returned by [`Hairdresser::add_observer`](crate::Hairdresser::add_observer).
    ObserverId,
    "observer"
);

impl ControllerId {
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

/// Monotonic counter starting at 1.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
    last: Cell<u64>,
}

impl IdGenerator {
    pub(crate) fn next<T: From<u64>>(&self) -> T {
        let id = self.last.get() + 1;
        self.last.set(id);
        T::from(id)
    }
}
