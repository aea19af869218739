//! String drawing over a built [`Face`].
//!
//! Layout model (no shaping, no kerning):
//! - Pen starts at (0, 0) on the first baseline.
//! - Each glyph is drawn at the pen, then the pen moves right by its advance.
//! - `'\n'` moves the pen back to x = 0 and down one `line_height`.
//! - Glyphs without triangles (space) are not drawn but still advance.
//! - Characters outside the face's table use its fallback glyph, or are skipped.
//!
//! [`render_string`] does not allocate; it only reads cached glyph buffers and
//! hands them to a [`GlyphDrawer`]. What a draw means is up to the drawer:
//! [`MeshBatch`] bakes glyphs into one mesh, a GPU layer would issue draw calls.

use glam::Vec2;

use crate::font::face::{Face, GlyphGeometry};
use crate::scene::{Mesh, MeshOverflow, append_translated};

/// Receives one draw per visible glyph.
pub trait GlyphDrawer {
    fn draw_glyph(&mut self, code: u32, glyph: &GlyphGeometry, origin: Vec2);
}

impl<F> GlyphDrawer for F
where
    F: FnMut(u32, &GlyphGeometry, Vec2),
{
    fn draw_glyph(&mut self, code: u32, glyph: &GlyphGeometry, origin: Vec2) {
        self(code, glyph, origin)
    }
}

/// Draw `text` starting at the origin. Returns the final pen position.
pub fn render_string<D>(face: &Face, text: &str, drawer: &mut D) -> Vec2
where
    D: GlyphDrawer + ?Sized,
{
    let mut pen = Vec2::ZERO;
    for ch in text.chars() {
        if ch == '\n' {
            pen.x = 0.0;
            pen.y -= face.line_height();
            continue;
        }

        let Some((code, glyph)) = face.glyph_or_fallback(u32::from(ch)) else {
            continue;
        };
        if glyph.triangle_count() > 0 {
            drawer.draw_glyph(code, glyph, pen);
        }
        pen.x += glyph.advance_x();
    }
    pen
}

/// Draw a single glyph at the origin. Returns `false` if `code` has nothing to draw.
pub fn render_glyph<D>(face: &Face, code: u32, drawer: &mut D) -> bool
where
    D: GlyphDrawer + ?Sized,
{
    match face.glyph(code) {
        Some(glyph) if glyph.triangle_count() > 0 => {
            drawer.draw_glyph(code, glyph, Vec2::ZERO);
            true
        }
        _ => false,
    }
}

/// Size of the laid-out text: widest line by number of lines times line height.
pub fn measure_string(face: &Face, text: &str) -> Vec2 {
    if text.is_empty() {
        return Vec2::ZERO;
    }

    let mut width = 0.0f32;
    let mut line = 0.0f32;
    let mut lines = 1usize;
    for ch in text.chars() {
        if ch == '\n' {
            width = width.max(line);
            line = 0.0;
            lines += 1;
            continue;
        }
        if let Some((_, glyph)) = face.glyph_or_fallback(u32::from(ch)) {
            line += glyph.advance_x();
        }
    }

    Vec2::new(width.max(line), lines as f32 * face.line_height())
}

/// Drawer that bakes every drawn glyph into one merged mesh.
#[derive(Debug, Default)]
pub struct MeshBatch {
    mesh: Mesh,
    overflow: Option<MeshOverflow>,
}

impl MeshBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The merged mesh, or the overflow if some glyph did not fit u16 indices.
    pub fn finish(self) -> Result<Mesh, MeshOverflow> {
        match self.overflow {
            Some(e) => Err(e),
            None => Ok(self.mesh),
        }
    }
}

impl GlyphDrawer for MeshBatch {
    fn draw_glyph(&mut self, code: u32, glyph: &GlyphGeometry, origin: Vec2) {
        if self.overflow.is_some() {
            return;
        }
        let offset = [origin.x, origin.y, 0.0];
        if let Err(e) = append_translated(&mut self.mesh, glyph.positions(), glyph.indices(), offset)
        {
            log::warn!("glyph {code:#x} dropped from batch: {e}");
            self.overflow = Some(e);
        }
    }
}

/// Merged mesh for a string plus its layout size.
#[derive(Debug, Clone)]
pub struct TextMesh {
    pub mesh: Mesh,
    pub size: Vec2,
}

/// Lay out `text` and bake it into a single mesh.
pub fn layout_text_to_mesh(face: &Face, text: &str) -> Result<TextMesh, MeshOverflow> {
    let mut batch = MeshBatch::new();
    render_string(face, text, &mut batch);
    Ok(TextMesh {
        mesh: batch.finish()?,
        size: measure_string(face, text),
    })
}
