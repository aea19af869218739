//! Thin binary wrapper for local development.
//!
//! Loads a system sans face, bakes a sample string into one mesh and logs what
//! was built. Set `GLYPHMESH_CONFIG` to a TOML file to override the face config.
//!
//! Run:
//! - `RUST_LOG=info cargo run`

use anyhow::Context as _;

use glyphmesh::font::resolve::default_text_query;
use glyphmesh::font::text::layout_text_to_mesh;
use glyphmesh::{FaceConfig, FontContext};

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let config = match std::env::var_os("GLYPHMESH_CONFIG") {
        Some(path) => FaceConfig::load(&path)
            .with_context(|| format!("config: failed to load {}", path.to_string_lossy()))?,
        None => FaceConfig::default(),
    };

    let ctx = FontContext::with_system_fonts().context("font: failed to load system fonts")?;
    let face = ctx
        .load_face(&default_text_query(), &config)
        .context("font: failed to build face")?;

    let text = "The quick brown fox\njumps over the lazy dog.";
    let baked = layout_text_to_mesh(&face, text).context("text: mesh too large")?;

    let [ink_w, ink_h] = baked.mesh.bounds().size();
    log::info!(
        "{:?}: {} vertices, {} triangles, layout {:.3} x {:.3}, ink {:.3} x {:.3}",
        text,
        baked.mesh.positions.len(),
        baked.mesh.triangle_count(),
        baked.size.x,
        baked.size.y,
        ink_w,
        ink_h
    );
    println!(
        "face: {} glyphs, {} triangles, line height {:.3}, reference width {:.3}",
        face.len(),
        face.total_triangles(),
        face.line_height(),
        face.reference_width()
    );

    ctx.unload_face(face);
    Ok(())
}
