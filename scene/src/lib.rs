//! Vector scene editing engine over a typed SVG element tree.
//!
//! SVG markup is parsed into a document plus a tree of typed elements, edited
//! through the [`engine::Engine`] (add, update, move, remove, duplicate,
//! undo/redo, milestones), and serialized back to markup. Connector lines can
//! bind their endpoints to other elements' anchor points and follow them
//! through every mutation.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Scene state, mutation API, undo/redo, milestones |
//! | [`doc`] | Document and element model, patches, element tree store |
//! | [`transform`] | Structured transforms and their affine view |
//! | [`geometry`] | Bounds, anchor points, the `Measure` surface |
//! | [`parse`] | Markup sanitizer and parser |
//! | [`serialize`] | Markup serializer |
//! | [`refs`] | Connector follow and the symbol library |
//! | [`hit`] | Snap search, marquee, resize handles |
//! | [`history`] | Undo stack, milestones, import records |
//! | [`arrange`] | Align, distribute, auto-connect, copy style |
//! | [`input`] | Pointer gestures and frame coalescing |
//! | [`config`] | Engine configuration and environment overrides |
//! | [`consts`] | Shared numeric defaults |

pub mod arrange;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod parse;
pub mod refs;
pub mod serialize;
pub mod transform;
