//! Glyph outline model and outline sources.
//!
//! An outline is what a font stores for one character: a list of closed contours,
//! each an ordered list of points tagged *on-curve* or *off-curve* (quadratic
//! control point), plus linear advance metrics. Everything here is in **font units**.
//!
//! Two ways to get an outline:
//! - [`GlyphOutline::from_raw`] decodes the flat FreeType-style layout
//!   (points, tag bytes, inclusive contour end indices).
//! - [`TtfOutlineSource`] reads TTF/OTF data through `ttf-parser`.
//!
//! The face builder only talks to the [`OutlineSource`] trait, so tests and callers
//! with their own font parser can plug in without touching the pipeline.

use std::collections::BTreeMap;

use glam::Vec3;

/// Tag bit marking an on-curve point in raw outline data.
pub const TAG_ON_CURVE: u8 = 0x01;

/// One outline point. `z` is always 0.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OutlinePoint {
    pub position: Vec3,
    pub on_curve: bool,
}

impl OutlinePoint {
    #[inline]
    pub fn on(x: f32, y: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            on_curve: true,
        }
    }

    #[inline]
    pub fn off(x: f32, y: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            on_curve: false,
        }
    }
}

/// A closed loop of outline points. The last point connects back to the first.
pub type Contour = Vec<OutlinePoint>;

/// Outline plus linear advances for one character, in font units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub contours: Vec<Contour>,
    pub advance_x: f32,
    pub advance_y: f32,
}

impl GlyphOutline {
    /// Decode the flat outline layout used by FreeType-style parsers.
    ///
    /// - `points[i]` is paired with `tags[i]`; bit 0 of the tag set means on-curve.
    /// - `contour_ends[c]` is the inclusive index of the last point of contour `c`.
    pub fn from_raw(
        points: &[[f32; 2]],
        tags: &[u8],
        contour_ends: &[u16],
        advance_x: f32,
        advance_y: f32,
    ) -> Result<Self, OutlineError> {
        if points.len() != tags.len() {
            return Err(OutlineError::Malformed(format!(
                "{} points but {} tags",
                points.len(),
                tags.len()
            )));
        }

        let mut contours = Vec::with_capacity(contour_ends.len());
        let mut start = 0usize;
        for &end in contour_ends {
            let end = end as usize;
            if end < start || end >= points.len() {
                return Err(OutlineError::Malformed(format!(
                    "contour end {end} out of order or past {} points",
                    points.len()
                )));
            }
            let non_finite = (start..=end).find(|&i| !points[i].iter().all(|c| c.is_finite()));
            if let Some(i) = non_finite {
                return Err(OutlineError::Malformed(format!(
                    "point {i} has a non-finite coordinate"
                )));
            }
            let contour = points[start..=end]
                .iter()
                .zip(&tags[start..=end])
                .map(|(p, &tag)| OutlinePoint {
                    position: Vec3::new(p[0], p[1], 0.0),
                    on_curve: tag & TAG_ON_CURVE != 0,
                })
                .collect();
            contours.push(contour);
            start = end + 1;
        }
        if start != points.len() {
            return Err(OutlineError::Malformed(format!(
                "{} points after the last contour end",
                points.len() - start
            )));
        }

        Ok(Self {
            contours,
            advance_x,
            advance_y,
        })
    }

    /// Total number of outline points across all contours.
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }
}

/// Errors produced while loading a single glyph outline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OutlineError {
    #[error("no glyph for character code {0:#x}")]
    GlyphNotFound(u32),

    #[error("missing horizontal advance for character code {0:#x}")]
    MissingMetrics(u32),

    #[error("malformed outline: {0}")]
    Malformed(String),
}

/// Anything that can hand out glyph outlines by character code.
pub trait OutlineSource {
    /// Font units per em; used to scale outlines to the face's reference size.
    fn units_per_em(&self) -> f32;

    /// Default line advance (ascender - descender + line gap) in font units.
    fn line_height(&self) -> f32;

    /// Load the outline for `code`.
    ///
    /// Characters that exist but have no outline (space) return an outline with no
    /// contours and valid advances.
    fn load_outline(&self, code: u32) -> Result<GlyphOutline, OutlineError>;
}

/// In-memory outlines keyed by character code.
///
/// Handy when outlines come from a parser this crate does not know about, and for
/// building faces from hand-made shapes.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutlineSource {
    units_per_em: f32,
    line_height: f32,
    glyphs: BTreeMap<u32, GlyphOutline>,
}

impl MemoryOutlineSource {
    pub fn new(units_per_em: f32, line_height: f32) -> Self {
        Self {
            units_per_em,
            line_height,
            glyphs: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, code: u32, outline: GlyphOutline) -> Option<GlyphOutline> {
        self.glyphs.insert(code, outline)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl OutlineSource for MemoryOutlineSource {
    fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn load_outline(&self, code: u32) -> Result<GlyphOutline, OutlineError> {
        self.glyphs
            .get(&code)
            .cloned()
            .ok_or(OutlineError::GlyphNotFound(code))
    }
}

/// [`OutlineSource`] over a parsed TrueType/OpenType face.
pub struct TtfOutlineSource<'a> {
    face: ttf_parser::Face<'a>,
    line_height: f32,
}

impl<'a> TtfOutlineSource<'a> {
    pub fn new(face: ttf_parser::Face<'a>) -> Self {
        let asc = face
            .typographic_ascender()
            .unwrap_or_else(|| face.ascender()) as f32;
        let desc = face
            .typographic_descender()
            .unwrap_or_else(|| face.descender()) as f32;
        let gap = face
            .typographic_line_gap()
            .unwrap_or_else(|| face.line_gap()) as f32;

        Self {
            face,
            line_height: asc - desc + gap,
        }
    }

    /// Parse face `index` of a font file or collection.
    pub fn parse(data: &'a [u8], index: u32) -> Result<Self, ttf_parser::FaceParsingError> {
        ttf_parser::Face::parse(data, index).map(Self::new)
    }
}

impl OutlineSource for TtfOutlineSource<'_> {
    fn units_per_em(&self) -> f32 {
        self.face.units_per_em() as f32
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn load_outline(&self, code: u32) -> Result<GlyphOutline, OutlineError> {
        let ch = char::from_u32(code).ok_or(OutlineError::GlyphNotFound(code))?;
        let gid = self
            .face
            .glyph_index(ch)
            .ok_or(OutlineError::GlyphNotFound(code))?;

        let advance_x = self
            .face
            .glyph_hor_advance(gid)
            .ok_or(OutlineError::MissingMetrics(code))? as f32;
        let advance_y = self
            .face
            .glyph_ver_advance(gid)
            .map(f32::from)
            .unwrap_or(self.line_height);

        let mut builder = TaggedOutlineBuilder::default();
        // `None` means the glyph has no outline (e.g. space); that is not an error.
        let _ = self.face.outline_glyph(gid, &mut builder);

        Ok(GlyphOutline {
            contours: builder.finish(),
            advance_x,
            advance_y,
        })
    }
}

/// Turns `ttf-parser` path callbacks back into tagged contour points.
///
/// Quadratic segments keep their control point as an off-curve point. Cubic
/// segments (CFF outlines) are split at t = 0.5 and each half is approximated by
/// one quadratic arc.
#[derive(Default)]
struct TaggedOutlineBuilder {
    contours: Vec<Contour>,
    current: Contour,
}

impl TaggedOutlineBuilder {
    fn last_position(&self) -> Vec3 {
        self.current
            .last()
            .map(|p| p.position)
            .unwrap_or(Vec3::ZERO)
    }

    fn flush(&mut self) {
        let mut contour = std::mem::take(&mut self.current);
        // Outlines usually return to their start explicitly; the closing point is implied.
        if contour.len() > 1 {
            let first = contour[0].position;
            let last = contour[contour.len() - 1];
            if last.on_curve && last.position == first {
                contour.pop();
            }
        }
        if !contour.is_empty() {
            self.contours.push(contour);
        }
    }

    fn finish(mut self) -> Vec<Contour> {
        self.flush();
        self.contours
    }
}

impl ttf_parser::OutlineBuilder for TaggedOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        self.current.push(OutlinePoint::on(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push(OutlinePoint::on(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.current.push(OutlinePoint::off(x1, y1));
        self.current.push(OutlinePoint::on(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last_position();
        let c1 = Vec3::new(x1, y1, 0.0);
        let c2 = Vec3::new(x2, y2, 0.0);
        let p3 = Vec3::new(x, y, 0.0);

        // de Casteljau split at the midpoint.
        let p01 = p0.lerp(c1, 0.5);
        let p12 = c1.lerp(c2, 0.5);
        let p23 = c2.lerp(p3, 0.5);
        let p012 = p01.lerp(p12, 0.5);
        let p123 = p12.lerp(p23, 0.5);
        let mid = p012.lerp(p123, 0.5);

        for (a, b, c, d) in [(p0, p01, p012, mid), (mid, p123, p23, p3)] {
            let ctrl = ((b + c) * 3.0 - a - d) * 0.25;
            self.current.push(OutlinePoint {
                position: ctrl,
                on_curve: false,
            });
            self.current.push(OutlinePoint {
                position: d,
                on_curve: true,
            });
        }
    }

    fn close(&mut self) {
        self.flush();
    }
}
