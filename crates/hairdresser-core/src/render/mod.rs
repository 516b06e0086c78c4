// ── Render modes ──
//
// `string` produces server-side markup in one pass; `dom` keeps a live
// document in sync through a render session.

pub mod dom;
pub mod string;
