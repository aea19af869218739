//! `glyphmesh` library crate root.
//!
//! Turns outline fonts into triangle meshes, one per character, built once when a
//! face is loaded, and lays strings out from that cache.
//!
//! Typical use:
//! - `font::FontContext::with_system_fonts()` (or `FontContext::new()` plus a path/bytes)
//! - `ctx.load_face(&query, &FaceConfig::default())`
//! - `font::text::render_string(&face, "Hello\nworld", &mut drawer)`
//!
//! The library does not initialize logging; it only emits `log` records.

pub mod config;
pub mod font;
pub mod scene;

pub use config::FaceConfig;
pub use font::face::{Face, GlyphGeometry};
pub use font::{FontContext, FontError, FontQuery};
