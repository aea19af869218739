//! Glyph cache: one triangle mesh per character code, built once per face.
//!
//! `build_face` walks the configured code range and, per character:
//! 1. loads the outline from an [`OutlineSource`],
//! 2. flattens every contour (`contour::extract_polyline`),
//! 3. tessellates all contours together (`tessellate::tessellate_polylines`),
//! 4. stores vertices scaled to `em_size` plus the scaled linear advances.
//!
//! Per-glyph problems (missing glyph, oversized contour, tessellator hiccup) are
//! logged and leave an empty or partial glyph; the face load goes on. Running out
//! of vertex pool is the one per-glyph failure that aborts the load.

use crate::config::{ConfigError, FaceConfig};
use crate::font::contour::{Polyline, check_contour_len, extract_polyline};
use crate::font::outline::{GlyphOutline, OutlineSource};
use crate::font::tessellate::{ScratchPool, TessError, tessellate_polylines};
use crate::scene::Aabb2;

/// GPU-friendly vertex: three floats, tightly packed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
}

/// Cached geometry and advances for one character.
///
/// Every index addresses `vertices`. A glyph without outline (space) has no
/// triangles but keeps its advances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphGeometry {
    vertices: Vec<GlyphVertex>,
    indices: Vec<u16>,
    advance_x: f32,
    advance_y: f32,
}

impl GlyphGeometry {
    /// Advance-only glyph.
    pub fn empty(advance_x: f32, advance_y: f32) -> Self {
        Self {
            advance_x,
            advance_y,
            ..Default::default()
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[GlyphVertex] {
        &self.vertices
    }

    /// Vertex positions as `[x, y, z]` triples.
    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw vertex buffer, ready for upload.
    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn advance_x(&self) -> f32 {
        self.advance_x
    }

    #[inline]
    pub fn advance_y(&self) -> f32 {
        self.advance_y
    }

    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        for &i in &self.indices {
            let p = self.vertices[i as usize].position;
            b.include_point([p[0], p[1]]);
        }
        b
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("font reports {0} units per em")]
    InvalidUnitsPerEm(f32),

    #[error("glyph {code:#x}: {source}")]
    Tessellation {
        code: u32,
        #[source]
        source: TessError,
    },
}

/// A loaded font face: glyph table plus face-level metrics.
#[derive(Debug, Clone)]
pub struct Face {
    first_code: u32,
    glyphs: Box<[GlyphGeometry]>,
    line_height: f32,
    reference_width: f32,
    units_per_em: f32,
    scale: f32,
    fallback: Option<u32>,
}

impl Face {
    /// Glyph for `code`, if it is inside the table.
    #[inline]
    pub fn glyph(&self, code: u32) -> Option<&GlyphGeometry> {
        let slot = code.checked_sub(self.first_code)?;
        self.glyphs.get(slot as usize)
    }

    /// Glyph for `code`, or the fallback glyph when `code` is outside the table.
    ///
    /// Returns the code actually used.
    #[inline]
    pub fn glyph_or_fallback(&self, code: u32) -> Option<(u32, &GlyphGeometry)> {
        if let Some(g) = self.glyph(code) {
            return Some((code, g));
        }
        let fallback = self.fallback?;
        self.glyph(fallback).map(|g| (fallback, g))
    }

    #[inline]
    pub fn first_code(&self) -> u32 {
        self.first_code
    }

    #[inline]
    pub fn last_code(&self) -> u32 {
        self.first_code + self.glyphs.len() as u32 - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// `(code, glyph)` for every slot in the table.
    pub fn glyphs(&self) -> impl Iterator<Item = (u32, &GlyphGeometry)> {
        (self.first_code..).zip(self.glyphs.iter())
    }

    /// Vertical distance between baselines.
    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Horizontal advance of the reference character.
    #[inline]
    pub fn reference_width(&self) -> f32 {
        self.reference_width
    }

    #[inline]
    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    /// Font units -> output units.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn total_triangles(&self) -> usize {
        self.glyphs.iter().map(GlyphGeometry::triangle_count).sum()
    }
}

/// Build the glyph table for `config.first_code..=config.last_code`.
pub fn build_face(source: &dyn OutlineSource, config: &FaceConfig) -> Result<Face, FaceError> {
    config.validate()?;

    let units_per_em = source.units_per_em();
    if units_per_em.is_nan() || units_per_em <= 0.0 {
        return Err(FaceError::InvalidUnitsPerEm(units_per_em));
    }
    let scale = config.em_size / units_per_em;

    // One pool per load; nothing is shared with other loads.
    let mut pool = ScratchPool::new(config.vertex_capacity);
    let mut glyphs = Vec::with_capacity(config.glyph_count());

    for code in config.first_code..=config.last_code {
        let glyph = match source.load_outline(code) {
            Ok(outline) => build_glyph(code, &outline, config, scale, &mut pool)?,
            Err(e) => {
                log::warn!("skipping glyph {code:#x}: {e}");
                GlyphGeometry::default()
            }
        };
        glyphs.push(glyph);
    }

    let mut face = Face {
        first_code: config.first_code,
        glyphs: glyphs.into_boxed_slice(),
        line_height: 0.0,
        reference_width: 0.0,
        units_per_em,
        scale,
        fallback: config
            .fallback_char
            .map(u32::from)
            .filter(|&c| (config.first_code..=config.last_code).contains(&c)),
    };

    let (ref_x, ref_y) = face
        .glyph(u32::from(config.reference_char))
        .map_or((0.0, 0.0), |g| (g.advance_x, g.advance_y));
    if ref_x > 0.0 {
        face.reference_width = ref_x;
    }
    if ref_y > 0.0 {
        face.line_height = ref_y;
    } else {
        log::warn!(
            "reference character {:?} has no vertical advance; using font line height",
            config.reference_char
        );
        face.line_height = source.line_height() * scale;
    }

    log::info!(
        "built face: {} glyphs ({:#x}..={:#x}), {} triangles, line height {}",
        face.len(),
        face.first_code(),
        face.last_code(),
        face.total_triangles(),
        face.line_height
    );

    Ok(face)
}

fn build_glyph(
    code: u32,
    outline: &GlyphOutline,
    config: &FaceConfig,
    scale: f32,
    pool: &mut ScratchPool,
) -> Result<GlyphGeometry, FaceError> {
    let advance_x = outline.advance_x * scale;
    let advance_y = outline.advance_y * scale;

    if let Some(err) = outline
        .contours
        .iter()
        .find_map(|c| check_contour_len(c, config.max_contour_points).err())
    {
        log::warn!("glyph {code:#x} left empty: {err}");
        return Ok(GlyphGeometry::empty(advance_x, advance_y));
    }

    let polylines: Vec<Polyline> = outline
        .contours
        .iter()
        .map(|c| extract_polyline(c, config.subdivisions))
        .filter(|p| !p.is_empty())
        .collect();

    let tess = tessellate_polylines(&polylines, pool)
        .map_err(|source| FaceError::Tessellation { code, source })?;
    if tess.errors > 0 {
        log::warn!("glyph {code:#x}: tessellation reported errors, geometry may be partial");
    }

    let vertices: Vec<GlyphVertex> = if tess.indices.is_empty() {
        Vec::new()
    } else {
        pool.points()
            .iter()
            .map(|p| GlyphVertex {
                position: (*p * scale).to_array(),
            })
            .collect()
    };

    log::debug!(
        "glyph {code:#x}: {} contours, {} vertices ({} combined), {} triangles",
        outline.contours.len(),
        vertices.len(),
        tess.combined,
        tess.triangle_count()
    );

    Ok(GlyphGeometry {
        vertices,
        indices: tess.indices,
        advance_x,
        advance_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::outline::{MemoryOutlineSource, OutlinePoint};

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<OutlinePoint> {
        vec![
            OutlinePoint::on(x0, y0),
            OutlinePoint::on(x1, y0),
            OutlinePoint::on(x1, y1),
            OutlinePoint::on(x0, y1),
        ]
    }

    fn source() -> MemoryOutlineSource {
        let mut src = MemoryOutlineSource::new(1000.0, 1200.0);
        src.insert(
            ' ' as u32,
            GlyphOutline {
                contours: Vec::new(),
                advance_x: 250.0,
                advance_y: 1200.0,
            },
        );
        src.insert(
            'M' as u32,
            GlyphOutline {
                contours: vec![square(0.0, 0.0, 800.0, 700.0)],
                advance_x: 900.0,
                advance_y: 1100.0,
            },
        );
        src.insert(
            'O' as u32,
            GlyphOutline {
                contours: vec![
                    square(0.0, 0.0, 600.0, 700.0),
                    square(100.0, 100.0, 500.0, 600.0),
                ],
                advance_x: 650.0,
                advance_y: 1100.0,
            },
        );
        src
    }

    #[test]
    fn table_covers_the_whole_range() {
        let face = build_face(&source(), &FaceConfig::default()).unwrap();
        assert_eq!(face.len(), 95);
        assert_eq!(face.first_code(), 32);
        assert_eq!(face.last_code(), 126);
        // Characters missing from the source are empty, zero-advance slots.
        let b = face.glyph('b' as u32).unwrap();
        assert_eq!(b.triangle_count(), 0);
        assert_eq!(b.advance_x(), 0.0);
        assert!(face.glyph(127).is_none());
        assert!(face.glyph(31).is_none());
    }

    #[test]
    fn space_has_advance_but_no_triangles() {
        let face = build_face(&source(), &FaceConfig::default()).unwrap();
        let space = face.glyph(32).unwrap();
        assert_eq!(space.triangle_count(), 0);
        assert!(space.vertices().is_empty());
        assert!((space.advance_x() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn reference_char_sets_face_metrics() {
        let face = build_face(&source(), &FaceConfig::default()).unwrap();
        assert!((face.line_height() - 1.1).abs() < 1e-6);
        assert!((face.reference_width() - 0.9).abs() < 1e-6);
        assert!((face.scale() - 0.001).abs() < 1e-9);
    }

    #[test]
    fn missing_reference_falls_back_to_font_line_height() {
        let config = FaceConfig {
            reference_char: 'Z',
            ..Default::default()
        };
        let face = build_face(&source(), &config).unwrap();
        assert!((face.line_height() - 1.2).abs() < 1e-6);
        assert_eq!(face.reference_width(), 0.0);
    }

    #[test]
    fn reference_width_survives_missing_vertical_advance() {
        let mut src = source();
        src.insert(
            'M' as u32,
            GlyphOutline {
                contours: vec![square(0.0, 0.0, 800.0, 700.0)],
                advance_x: 900.0,
                advance_y: 0.0,
            },
        );
        let face = build_face(&src, &FaceConfig::default()).unwrap();
        assert!((face.line_height() - 1.2).abs() < 1e-6);
        assert!((face.reference_width() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn non_finite_outline_leaves_glyph_empty() {
        let mut src = source();
        for (code, bad) in [('N', f32::NAN), ('I', f32::INFINITY)] {
            src.insert(
                code as u32,
                GlyphOutline {
                    contours: vec![vec![
                        OutlinePoint::on(100.0, 0.0),
                        OutlinePoint::on(bad, 5.0),
                        OutlinePoint::on(200.0, 200.0),
                    ]],
                    advance_x: 700.0,
                    advance_y: 1100.0,
                },
            );
        }

        let face = build_face(&src, &FaceConfig::default()).unwrap();
        for code in ['N', 'I'] {
            let g = face.glyph(code as u32).unwrap();
            assert_eq!(g.triangle_count(), 0);
            assert!(g.vertices().is_empty());
            assert!((g.advance_x() - 0.7).abs() < 1e-6);
        }
        assert!(face.glyph('O' as u32).unwrap().triangle_count() > 0);
    }

    #[test]
    fn glyph_geometry_is_scaled_and_indexed() {
        let config = FaceConfig {
            em_size: 10.0,
            ..Default::default()
        };
        let face = build_face(&source(), &config).unwrap();
        let o = face.glyph('O' as u32).unwrap();

        assert!(o.triangle_count() > 0);
        assert!(o.indices().iter().all(|&i| (i as usize) < o.vertices().len()));
        let b = o.bounds();
        assert!((b.max[0] - 6.0).abs() < 1e-5);
        assert!((b.max[1] - 7.0).abs() < 1e-5);
        assert_eq!(o.vertex_bytes().len(), o.vertices().len() * 12);
        assert_eq!(o.positions().len(), o.vertices().len());
    }

    #[test]
    fn oversized_contour_leaves_glyph_empty() {
        let config = FaceConfig {
            max_contour_points: 3,
            ..Default::default()
        };
        let face = build_face(&source(), &config).unwrap();
        let m = face.glyph('M' as u32).unwrap();
        assert_eq!(m.triangle_count(), 0);
        assert!((m.advance_x() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn pool_exhaustion_fails_the_load() {
        let config = FaceConfig {
            vertex_capacity: 5,
            ..Default::default()
        };
        let err = build_face(&source(), &config).unwrap_err();
        assert!(matches!(
            err,
            FaceError::Tessellation {
                code: 0x4f,
                source: TessError::PoolExhausted { capacity: 5 }
            }
        ));
    }

    #[test]
    fn fallback_must_be_inside_the_table() {
        let face = build_face(&source(), &FaceConfig::default()).unwrap();
        let (code, _) = face.glyph_or_fallback(0x263a).unwrap();
        assert_eq!(code, '?' as u32);

        let config = FaceConfig {
            first_code: 'A' as u32,
            last_code: 'Z' as u32,
            ..Default::default()
        };
        let face = build_face(&source(), &config).unwrap();
        assert!(face.glyph_or_fallback('a' as u32).is_none());
    }

    #[test]
    fn rejects_zero_units_per_em() {
        let src = MemoryOutlineSource::new(0.0, 0.0);
        assert!(matches!(
            build_face(&src, &FaceConfig::default()),
            Err(FaceError::InvalidUnitsPerEm(_))
        ));
    }
}
