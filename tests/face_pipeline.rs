//! End-to-end: outlines -> face -> string layout.
//!
//! Uses hand-made outlines so the test does not depend on installed fonts; the
//! last test runs against a system font when one is available.

use glam::Vec2;

use glyphmesh::font::face::{GlyphGeometry, build_face};
use glyphmesh::font::outline::{GlyphOutline, MemoryOutlineSource, OutlinePoint};
use glyphmesh::font::resolve::default_text_query;
use glyphmesh::font::text::{layout_text_to_mesh, render_string};
use glyphmesh::{FaceConfig, FontContext};

const UPM: f32 = 1000.0;

fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<OutlinePoint> {
    vec![
        OutlinePoint::on(x0, y0),
        OutlinePoint::on(x1, y0),
        OutlinePoint::on(x1, y1),
        OutlinePoint::on(x0, y1),
    ]
}

/// A ring with rounded corners: every corner is a quadratic arc, and the inner
/// contour runs the opposite way.
fn ring() -> GlyphOutline {
    let points = [
        // outer, corners as off-curve points
        [100.0, 0.0],
        [500.0, 0.0],
        [600.0, 0.0],
        [600.0, 100.0],
        [600.0, 600.0],
        [600.0, 700.0],
        [500.0, 700.0],
        [100.0, 700.0],
        [0.0, 700.0],
        [0.0, 600.0],
        [0.0, 100.0],
        [0.0, 0.0],
        // inner
        [150.0, 150.0],
        [150.0, 550.0],
        [450.0, 550.0],
        [450.0, 150.0],
    ];
    let tags = [1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 1, 1];
    GlyphOutline::from_raw(&points, &tags, &[11, 15], 650.0, 1150.0).unwrap()
}

fn source() -> MemoryOutlineSource {
    let mut src = MemoryOutlineSource::new(UPM, 1200.0);
    src.insert(
        ' ' as u32,
        GlyphOutline {
            contours: Vec::new(),
            advance_x: 260.0,
            advance_y: 1150.0,
        },
    );
    src.insert(
        'A' as u32,
        GlyphOutline {
            contours: vec![vec![
                OutlinePoint::on(0.0, 0.0),
                OutlinePoint::on(600.0, 0.0),
                OutlinePoint::on(300.0, 700.0),
            ]],
            advance_x: 620.0,
            advance_y: 1150.0,
        },
    );
    src.insert(
        'B' as u32,
        GlyphOutline {
            contours: vec![rect(0.0, 0.0, 500.0, 700.0)],
            advance_x: 560.0,
            advance_y: 1150.0,
        },
    );
    src.insert(
        'C' as u32,
        GlyphOutline {
            contours: vec![rect(0.0, 0.0, 500.0, 100.0)],
            advance_x: 540.0,
            advance_y: 1150.0,
        },
    );
    src.insert(
        'M' as u32,
        GlyphOutline {
            contours: vec![rect(0.0, 0.0, 800.0, 700.0)],
            advance_x: 860.0,
            advance_y: 1150.0,
        },
    );
    src.insert('O' as u32, ring());
    src
}

fn area(glyph: &GlyphGeometry) -> f32 {
    let p = glyph.positions();
    glyph
        .indices()
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (p[t[0] as usize], p[t[1] as usize], p[t[2] as usize]);
            0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
        })
        .sum::<f32>()
        .abs()
}

#[test]
fn printable_ascii_face() {
    let face = build_face(&source(), &FaceConfig::default()).unwrap();

    assert_eq!(face.len(), 95);
    let space = face.glyph(32).unwrap();
    assert_eq!(space.triangle_count(), 0);
    assert!(space.advance_x() > 0.0);

    for (code, glyph) in face.glyphs() {
        let n = glyph.vertices().len();
        assert!(
            glyph.indices().iter().all(|&i| (i as usize) < n),
            "glyph {code:#x} has an out-of-range index"
        );
    }

    assert!((face.line_height() - 1.15).abs() < 1e-6);
    assert!((face.reference_width() - 0.86).abs() < 1e-6);
}

#[test]
fn ring_hole_is_subtracted() {
    let config = FaceConfig {
        subdivisions: 8,
        ..Default::default()
    };
    let face = build_face(&source(), &config).unwrap();
    let o = face.glyph('O' as u32).unwrap();

    // Outer 0.6 x 0.7 minus four corner cut-offs, minus the 0.3 x 0.4 hole.
    // A quadratic corner of radius r leaves r^2 / 6 of the square corner unfilled.
    let r = 0.1f32;
    let outer = 0.6 * 0.7 - 4.0 * (r * r / 6.0);
    let expected = outer - 0.3 * 0.4;
    let got = area(o);
    assert!((got - expected).abs() < 2e-3, "area {got}, expected {expected}");
}

#[test]
fn string_layout_follows_advances_and_lines() {
    let face = build_face(&source(), &FaceConfig::default()).unwrap();

    let mut draws: Vec<(u32, Vec2)> = Vec::new();
    let end = render_string(&face, "AB\nC", &mut |code: u32, _: &GlyphGeometry, at: Vec2| {
        draws.push((code, at));
    });

    let advance_a = face.glyph('A' as u32).unwrap().advance_x();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0], ('A' as u32, Vec2::ZERO));
    assert_eq!(draws[1], ('B' as u32, Vec2::new(advance_a, 0.0)));
    assert_eq!(draws[2], ('C' as u32, Vec2::new(0.0, -face.line_height())));
    assert!((end.x - 0.54).abs() < 1e-6);
}

#[test]
fn baked_string_mesh() {
    let face = build_face(&source(), &FaceConfig::default()).unwrap();
    let text = layout_text_to_mesh(&face, "B B").unwrap();
    let b = face.glyph('B' as u32).unwrap();

    assert_eq!(text.mesh.triangle_count(), 2 * b.triangle_count());
    let bounds = text.mesh.bounds();
    assert!((bounds.max[0] - (0.56 + 0.26 + 0.5)).abs() < 1e-5);
}

#[test]
fn system_font_smoke() {
    let Ok(ctx) = FontContext::with_system_fonts() else {
        eprintln!("no system fonts; skipping");
        return;
    };
    let Ok(face) = ctx.load_face(&default_text_query(), &FaceConfig::default()) else {
        eprintln!("default face did not load; skipping");
        return;
    };

    assert_eq!(face.len(), 95);
    assert!(face.line_height() > 0.0);
    assert_eq!(face.glyph(' ' as u32).unwrap().triangle_count(), 0);
    for (_, glyph) in face.glyphs() {
        let n = glyph.vertices().len();
        assert!(glyph.indices().iter().all(|&i| (i as usize) < n));
    }
    ctx.unload_face(face);
}
