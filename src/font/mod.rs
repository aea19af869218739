//! Font module root.
//!
//! Glyphs become triangle meshes once, at face load time:
//! - Open a font (path, bytes, or a family query against `fontdb`).
//! - Read each glyph's tagged outline (`outline`), flatten its contours (`contour`).
//! - Tessellate all contours of a glyph together, even-odd (`tessellate`).
//! - Cache geometry and advances per character code (`face`).
//! - Draw strings from the cache (`text`).
//!
//! [`FontContext`] owns the font database and is the entry point for loading faces.
//! It holds no scratch state: every load builds with its own vertex pool.

pub mod contour;
pub mod face;
pub mod outline;
pub mod resolve;
pub mod tessellate;
pub mod text;

use std::{fs, path::Path, sync::Arc};

use fontdb::{Database, ID};

use crate::config::FaceConfig;
use crate::font::face::{Face, FaceError, build_face};
use crate::font::outline::TtfOutlineSource;

/// A stable identifier for a face in the context's database.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontFaceId(pub ID);

/// Font selection by family list and style.
#[derive(Debug, Clone, Default)]
pub struct FontQuery {
    /// Preferred family names, in priority order. Generic names (`serif`,
    /// `sans-serif`, `monospace`) are understood.
    pub families: Vec<String>,

    /// CSS-style weight (100..900); 400 is regular.
    pub weight: u16,

    pub italic: bool,
}

/// A resolved face: full font file/collection bytes plus the face index in it.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face_id: FontFaceId,
    pub bytes: Arc<[u8]>,
    pub index: u32,
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found in the font database")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("failed to read font file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font face: {0}")]
    ParseFailed(#[from] ttf_parser::FaceParsingError),

    #[error(transparent)]
    Face(#[from] FaceError),
}

/// Owns the font database and loads faces.
pub struct FontContext {
    db: Database,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    /// Context with an empty database. Faces can still be loaded from paths or bytes.
    pub fn new() -> Self {
        Self {
            db: Database::new(),
        }
    }

    /// Context with system fonts loaded. Fails when the system has none.
    pub fn with_system_fonts() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();

        if db.faces().next().is_none() {
            return Err(FontError::NoFontsAvailable);
        }
        log::info!("font database: {} faces", db.len());

        Ok(Self { db })
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolve `query` against the database.
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        resolve::resolve_face(&self.db, query)
    }

    /// Resolve `query` and build a face from the match.
    pub fn load_face(&self, query: &FontQuery, config: &FaceConfig) -> Result<Face, FontError> {
        let resolved = self.resolve(query)?;
        self.load_face_from_bytes(&resolved.bytes, resolved.index, config)
    }

    /// Build a face from a font file on disk.
    pub fn load_face_from_path(
        &self,
        path: impl AsRef<Path>,
        index: u32,
        config: &FaceConfig,
    ) -> Result<Face, FontError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FontError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        self.load_face_from_bytes(&data, index, config)
    }

    /// Build a face from in-memory font data.
    pub fn load_face_from_bytes(
        &self,
        data: &[u8],
        index: u32,
        config: &FaceConfig,
    ) -> Result<Face, FontError> {
        let source = TtfOutlineSource::parse(data, index)?;
        Ok(build_face(&source, config)?)
    }

    /// Release a face and all of its glyph buffers.
    pub fn unload_face(&self, face: Face) {
        log::debug!(
            "unloading face: {} glyphs, {} triangles",
            face.len(),
            face.total_triangles()
        );
        drop(face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_read_error() {
        let ctx = FontContext::new();
        let err = ctx
            .load_face_from_path("/nonexistent/font.ttf", 0, &FaceConfig::default())
            .unwrap_err();
        assert!(matches!(err, FontError::ReadFailed { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let ctx = FontContext::new();
        let err = ctx
            .load_face_from_bytes(b"not a font", 0, &FaceConfig::default())
            .unwrap_err();
        assert!(matches!(err, FontError::ParseFailed(_)));
    }

    #[test]
    fn empty_context_cannot_resolve() {
        let ctx = FontContext::new();
        assert!(matches!(
            ctx.load_face(&resolve::default_text_query(), &FaceConfig::default()),
            Err(FontError::NoFontsAvailable)
        ));
    }
}
