//! Polygon tessellation for glyph outlines.
//!
//! All flattened contours of one glyph go into a single lyon fill pass with the
//! **even-odd** rule, so inner contours cut holes out of outer ones and
//! self-overlapping outlines resolve the same way.
//!
//! The tessellator reports its output through the [`TessellationSink`] visitor:
//! - `begin(kind)` / `vertex(index)` / `end()` for primitives,
//! - `combine(coords)` when two edges cross and a new vertex is needed,
//! - `error(err)` for recoverable tessellator failures.
//!
//! [`TriangleCollector`] is the sink the face builder uses: it flattens triangle
//! lists, fans and strips into one triangle index list and takes combined
//! vertices from a [`ScratchPool`].
//!
//! Vertex indices refer to the pool: input points keep the index they were staged
//! at (carried through lyon as a path attribute) and combined points get the next
//! free slot. The pool has a hard capacity; running out is an error, never a
//! silent wrap.

use std::ops::Range;

use glam::Vec3;
use lyon::math::point;
use lyon::path::{EndpointId, Path};
use lyon::tessellation::{
    FillGeometryBuilder, FillOptions, FillRule, FillTessellator, FillVertex, GeometryBuilder,
    GeometryBuilderError, VertexId, VertexSource,
};

/// Largest pool the u16 index buffers can address.
pub const MAX_POOL_CAPACITY: usize = u16::MAX as usize;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TessError {
    #[error("vertex pool exhausted ({capacity} vertices reserved)")]
    PoolExhausted { capacity: usize },

    #[error("non-finite outline coordinate at pool index {index}")]
    NonFinite { index: usize },

    #[error("tessellation failed: {0}")]
    Tessellator(String),
}

impl TessError {
    /// Errors that abort the whole face load rather than one glyph.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}

/// How the vertices between `begin` and `end` form triangles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Independent triangles, three indices each.
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Receives tessellator output.
pub trait TessellationSink {
    fn begin(&mut self, kind: PrimitiveKind);

    fn vertex(&mut self, index: u16);

    fn end(&mut self);

    /// Store a vertex created at an edge crossing and return its index.
    fn combine(&mut self, coords: Vec3) -> Result<u16, TessError>;

    /// A recoverable tessellator error. Output produced so far stays valid.
    fn error(&mut self, err: &TessError);
}

/// Growable point buffer with a fixed upper bound, owned by one face load.
#[derive(Debug, Clone)]
pub struct ScratchPool {
    points: Vec<Vec3>,
    capacity: usize,
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(MAX_POOL_CAPACITY)
    }
}

impl ScratchPool {
    /// `capacity` is clamped to [`MAX_POOL_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::new(),
            capacity: capacity.min(MAX_POOL_CAPACITY),
        }
    }

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append one point and return its index.
    pub fn push(&mut self, p: Vec3) -> Result<u16, TessError> {
        if self.points.len() >= self.capacity {
            return Err(TessError::PoolExhausted {
                capacity: self.capacity,
            });
        }
        let index = self.points.len() as u16;
        self.points.push(p);
        Ok(index)
    }

    /// Append a whole polyline, returning the index range it occupies.
    pub fn stage(&mut self, polyline: &[Vec3]) -> Result<Range<usize>, TessError> {
        let start = self.points.len();
        if start + polyline.len() > self.capacity {
            return Err(TessError::PoolExhausted {
                capacity: self.capacity,
            });
        }
        self.points.extend_from_slice(polyline);
        Ok(start..self.points.len())
    }
}

/// Rolling state that turns strips and fans into independent triangles.
#[derive(Debug, Copy, Clone, Default)]
pub struct TessellationState {
    kind: PrimitiveKind,
    cached: usize,
    window: [u16; 2],
    flipped: bool,
}

impl TessellationState {
    pub fn begin(&mut self, kind: PrimitiveKind) {
        *self = Self {
            kind,
            ..Default::default()
        };
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Feed one vertex, appending any completed triangle to `out`.
    pub fn push(&mut self, index: u16, out: &mut Vec<u16>) {
        if self.kind != PrimitiveKind::Triangles && self.cached < 2 {
            self.window[self.cached] = index;
            self.cached += 1;
            return;
        }

        let [v0, v1] = self.window;
        match self.kind {
            PrimitiveKind::Triangles => out.push(index),
            PrimitiveKind::TriangleStrip => {
                if self.flipped {
                    out.extend_from_slice(&[index, v1, v0]);
                } else {
                    out.extend_from_slice(&[index, v0, v1]);
                }
                self.window = [v1, index];
                self.flipped = !self.flipped;
            }
            PrimitiveKind::TriangleFan => {
                out.extend_from_slice(&[index, v0, v1]);
                self.window[1] = index;
            }
        }
    }
}

/// Default sink: one flat triangle index list, combined vertices go to the pool.
pub struct TriangleCollector<'p> {
    pool: &'p mut ScratchPool,
    state: TessellationState,
    indices: Vec<u16>,
    combined: usize,
    errors: usize,
}

impl<'p> TriangleCollector<'p> {
    pub fn new(pool: &'p mut ScratchPool) -> Self {
        Self {
            pool,
            state: TessellationState::default(),
            indices: Vec::new(),
            combined: 0,
            errors: 0,
        }
    }

    pub fn finish(self) -> Tessellation {
        Tessellation {
            indices: self.indices,
            combined: self.combined,
            errors: self.errors,
        }
    }
}

impl TessellationSink for TriangleCollector<'_> {
    fn begin(&mut self, kind: PrimitiveKind) {
        self.state.begin(kind);
    }

    fn vertex(&mut self, index: u16) {
        debug_assert!((index as usize) < self.pool.points.len());
        self.state.push(index, &mut self.indices);
    }

    fn end(&mut self) {}

    fn combine(&mut self, coords: Vec3) -> Result<u16, TessError> {
        let index = self.pool.push(coords)?;
        self.combined += 1;
        Ok(index)
    }

    fn error(&mut self, _err: &TessError) {
        self.errors += 1;
    }
}

/// Result of [`tessellate_polylines`]. Vertex data lives in the pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    pub indices: Vec<u16>,
    /// Vertices synthesized at edge crossings.
    pub combined: usize,
    /// Recoverable errors reported during the pass.
    pub errors: usize,
}

impl Tessellation {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Stage `polylines` into `pool` (cleared first) and tessellate them as one polygon.
///
/// On success the pool holds the input points followed by any combined vertices,
/// and every returned index addresses it.
///
/// Input with a NaN or infinite coordinate is not tessellated: it is reported as
/// one recoverable error and yields no triangles.
pub fn tessellate_polylines(
    polylines: &[Vec<Vec3>],
    pool: &mut ScratchPool,
) -> Result<Tessellation, TessError> {
    pool.clear();
    let mut ranges = Vec::with_capacity(polylines.len());
    for poly in polylines {
        ranges.push(pool.stage(poly)?);
    }

    if ranges.iter().all(|r| r.len() < 3) {
        return Ok(Tessellation::default());
    }

    let non_finite = pool.points().iter().position(|p| !p.is_finite());
    let path = build_path(pool.points(), &ranges);
    let mut collector = TriangleCollector::new(pool);
    if let Some(index) = non_finite {
        let err = TessError::NonFinite { index };
        log::warn!("{err}; skipping tessellation");
        collector.error(&err);
        return Ok(collector.finish());
    }
    tessellate_path_into(&path, &mut collector)?;
    Ok(collector.finish())
}

/// Build a line-only lyon path; each endpoint carries its pool index as attribute 0.
///
/// Contours with fewer than two points or any non-finite coordinate are left out.
pub fn build_path(points: &[Vec3], contours: &[Range<usize>]) -> Path {
    let mut b = Path::builder_with_attributes(1);
    for range in contours {
        if range.len() < 2 || points[range.clone()].iter().any(|p| !p.is_finite()) {
            continue;
        }
        let mut indices = range.clone();
        let Some(first) = indices.next() else {
            continue;
        };
        let p = points[first];
        b.begin(point(p.x, p.y), &[first as f32]);
        for i in indices {
            let p = points[i];
            b.line_to(point(p.x, p.y), &[i as f32]);
        }
        b.end(true);
    }
    b.build()
}

/// Run the even-odd fill tessellator over `path`, reporting into `sink`.
///
/// Fatal errors from `sink.combine` (pool exhaustion) are returned. Any other
/// failure, from the sink or from lyon, goes to `sink.error`, is logged, and
/// whatever triangles were emitted before it are kept.
pub fn tessellate_path_into<S>(path: &Path, sink: &mut S) -> Result<(), TessError>
where
    S: TessellationSink + ?Sized,
{
    let options = FillOptions::default().with_fill_rule(FillRule::EvenOdd);
    let mut tess = FillTessellator::new();
    let mut adapter = LyonAdapter {
        path,
        sink,
        failure: None,
    };

    adapter.sink.begin(PrimitiveKind::Triangles);
    let res = tess.tessellate_path(path, &options, &mut adapter);
    adapter.sink.end();

    let failure = adapter.failure.take();
    if let Some(fatal) = failure.as_ref().filter(|e| e.is_fatal()) {
        return Err(fatal.clone());
    }
    if let Err(e) = res {
        let err = failure.unwrap_or_else(|| TessError::Tessellator(format!("{e:?}")));
        log::warn!("{err}; keeping partial geometry");
        adapter.sink.error(&err);
    }
    Ok(())
}

/// Bridges lyon's geometry builder callbacks to a [`TessellationSink`].
struct LyonAdapter<'a, S: ?Sized> {
    path: &'a Path,
    sink: &'a mut S,
    failure: Option<TessError>,
}

impl<S> LyonAdapter<'_, S>
where
    S: TessellationSink + ?Sized,
{
    fn endpoint_index(&self, id: EndpointId) -> Option<u16> {
        self.path.attributes(id).first().map(|&i| i as u16)
    }
}

impl<S> GeometryBuilder for LyonAdapter<'_, S>
where
    S: TessellationSink + ?Sized,
{
    fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) {
        for id in [a, b, c] {
            self.sink.vertex(id.0 as u16);
        }
    }
}

impl<S> FillGeometryBuilder for LyonAdapter<'_, S>
where
    S: TessellationSink + ?Sized,
{
    fn add_fill_vertex(&mut self, vertex: FillVertex) -> Result<VertexId, GeometryBuilderError> {
        let staged = vertex.sources().find_map(|src| match src {
            VertexSource::Endpoint { id } => Some(id),
            VertexSource::Edge { .. } => None,
        });
        if let Some(index) = staged.and_then(|id| self.endpoint_index(id)) {
            return Ok(VertexId(index as u32));
        }

        // Only edges meet here: an intersection the tessellator had to create.
        let p = vertex.position();
        match self.sink.combine(Vec3::new(p.x, p.y, 0.0)) {
            Ok(index) => Ok(VertexId(index as u32)),
            Err(e) => {
                self.failure = Some(e);
                Err(GeometryBuilderError::TooManyVertices)
            }
        }
    }
}
