// ── Per-instance state ──
//
// Everything a `Hairdresser` owns: the active-controller registry and the
// observer list. Neither is reachable except through the owning instance.

mod observers;
mod registry;

pub(crate) use observers::ObserverList;
pub(crate) use registry::ActiveRegistry;
