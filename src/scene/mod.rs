//! Renderer-agnostic mesh output.
//!
//! Glyph geometry stays per glyph inside a `Face`; this module holds the types
//! used when glyphs are baked together for a caller (one merged mesh per string)
//! and the bounds helpers used for layout.
//!
//! Coordinates are in face output units (see `FaceConfig::em_size`), Y up.

/// Axis-aligned bounding box in the XY plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb2 {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb2 {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY],
            max: [f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    #[inline]
    pub fn include_point(&mut self, p: [f32; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    #[inline]
    pub fn size(&self) -> [f32; 2] {
        if self.is_empty() {
            return [0.0, 0.0];
        }
        [self.max[0] - self.min[0], self.max[1] - self.min[1]]
    }
}

/// Owned CPU triangle mesh with 16-bit indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl Mesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        for p in &self.positions {
            b.include_point([p[0], p[1]]);
        }
        b
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("mesh would exceed {} vertices addressable by u16 indices", u16::MAX as usize + 1)]
pub struct MeshOverflow;

/// Append `positions`/`indices` into `dst`, translating positions by `offset`.
///
/// Leaves `dst` untouched when the combined vertex count no longer fits u16 indices.
pub fn append_translated(
    dst: &mut Mesh,
    positions: &[[f32; 3]],
    indices: &[u16],
    offset: [f32; 3],
) -> Result<(), MeshOverflow> {
    let base = dst.positions.len();
    if base + positions.len() > u16::MAX as usize + 1 {
        return Err(MeshOverflow);
    }

    dst.positions.extend(
        positions
            .iter()
            .map(|p| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]]),
    );

    let base_u16 = base as u16;
    dst.indices.extend(indices.iter().map(|&i| base_u16 + i));
    Ok(())
}
