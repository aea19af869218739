//! Font face resolution.
//!
//! Maps a [`FontQuery`] (families, weight, italic) onto a face in a
//! `fontdb::Database` and hands back its bytes:
//! - try each named family in order with the requested weight/style,
//! - generic names (`serif`, `sans-serif`, `monospace`) map to fontdb's generics,
//! - then fall back to `serif`, then to the first face in the database.

use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};

use crate::font::{FontError, FontFaceId, FontQuery, ResolvedFace};

/// Resolve `query` to a concrete face and copy out its data.
pub fn resolve_face(db: &Database, query: &FontQuery) -> Result<ResolvedFace, FontError> {
    let first = db.faces().next().ok_or(FontError::NoFontsAvailable)?.id;

    let style = if query.italic {
        Style::Italic
    } else {
        Style::Normal
    };
    let weight = Weight(query.weight.clamp(1, 1000));

    let families: Vec<Family<'_>> = query
        .families
        .iter()
        .map(|f| f.trim())
        .filter(|s| !s.is_empty())
        .map(generic_family)
        .collect();

    let id = db
        .query(&Query {
            families: &families,
            weight,
            style,
            stretch: Stretch::Normal,
        })
        .or_else(|| {
            db.query(&Query {
                families: &[Family::Serif],
                weight,
                style,
                stretch: Stretch::Normal,
            })
        })
        .unwrap_or(first);

    let (bytes, index) = db
        .with_face_data(id, |data, index| (Arc::<[u8]>::from(data), index))
        .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

    log::debug!("resolved {:?} to face {id:?} (index {index})", query.families);

    Ok(ResolvedFace {
        face_id: FontFaceId(id),
        bytes,
        index,
    })
}

fn generic_family(name: &str) -> Family<'_> {
    if name.eq_ignore_ascii_case("serif") {
        Family::Serif
    } else if name.eq_ignore_ascii_case("sans-serif") || name.eq_ignore_ascii_case("sans") {
        Family::SansSerif
    } else if name.eq_ignore_ascii_case("monospace") || name.eq_ignore_ascii_case("mono") {
        Family::Monospace
    } else {
        Family::Name(name)
    }
}

/// A reasonable query for UI text: common sans faces, then any sans.
pub fn default_text_query() -> FontQuery {
    FontQuery {
        families: vec![
            "DejaVu Sans".to_string(),
            "Liberation Sans".to_string(),
            "Noto Sans".to_string(),
            "Arial".to_string(),
            "sans-serif".to_string(),
        ],
        weight: 400,
        italic: false,
    }
}
