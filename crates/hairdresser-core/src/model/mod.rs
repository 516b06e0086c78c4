// ── Domain model ──
//
// Value types shared by every layer of the crate.

pub mod attrs;
pub mod ids;

pub use attrs::{AttrMap, AttrSet, attrs_from_value, to_html, to_selector};
pub use ids::{ControllerId, ObserverId, OverrideId};
pub(crate) use ids::IdGenerator;
