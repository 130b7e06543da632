use std::f64::consts::{PI, TAU};

use color_lib::color::{sRGB, to_string};
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Rectangle};
use svg::Document;

/// One ordering of a palette, drawn as a row of swatches.
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    pub label: String,
    pub colors: Vec<sRGB>,
    pub highlight: bool,
}

// angle 0 is twelve o'clock, increasing clockwise on screen
fn get_position(radius: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (sin * radius, -cos * radius)
}

fn make_slice((r_inner, r_outer): (f64, f64), (start, end): (f64, f64), color: &sRGB) -> Path {
    let large = if end - start > PI { 1 } else { 0 };
    let c1 = get_position(r_inner, start);
    let c2 = get_position(r_inner, end);
    let c3 = get_position(r_outer, end);
    let c4 = get_position(r_outer, start);

    let data = Data::new()
        .move_to(c1)
        .elliptical_arc_to((r_inner, r_inner, 0, large, 1, c2.0, c2.1))
        .line_to(c3)
        .elliptical_arc_to((r_outer, r_outer, 0, large, 0, c4.0, c4.1))
        .close();

    Path::new().set("fill", to_string(color)).set("d", data)
}

/// The order wrapped around a ring, so the seam between last and first
/// color is visible too.
fn make_wheel(radii: (f64, f64), colors: &[sRGB]) -> Vec<Path> {
    match colors.len() {
        0 => Vec::new(),
        // a full-circle arc has identical endpoints and would not render
        1 => vec![
            make_slice(radii, (0.0, PI), &colors[0]),
            make_slice(radii, (PI, TAU), &colors[0]),
        ],
        n => {
            let step = TAU / n as f64;
            colors
                .iter()
                .enumerate()
                .map(|(i, c)| make_slice(radii, (i as f64 * step, (i + 1) as f64 * step), c))
                .collect()
        }
    }
}

fn make_strip(strip: &Strip, y: f64, swatch: f64) -> Group {
    let row = strip
        .colors
        .iter()
        .enumerate()
        .fold(Group::new().set("id", strip.label.as_str()), |group, (i, c)| {
            group.add(
                Rectangle::new()
                    .set("x", i as f64 * swatch)
                    .set("y", y)
                    .set("width", swatch)
                    .set("height", swatch)
                    .set("fill", to_string(c)),
            )
        });
    if !strip.highlight {
        return row;
    }
    row.add(
        Rectangle::new()
            .set("x", 0)
            .set("y", y)
            .set("width", strip.colors.len() as f64 * swatch)
            .set("height", swatch)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", swatch / 8.0),
    )
}

/// Strips stacked top to bottom, with the first highlighted strip also
/// drawn as a wheel to their right.
pub fn make_document(strips: &[Strip], swatch: f64, gap: f64) -> Document {
    let columns = strips.iter().map(|s| s.colors.len()).max().unwrap_or(0);
    let width = columns as f64 * swatch;
    let radius = swatch * 2.0;
    let height = (strips.len() as f64 * (swatch + gap)).max(2.0 * radius);

    let document = strips.iter().enumerate().fold(Document::new(), |doc, (i, strip)| {
        doc.add(make_strip(strip, i as f64 * (swatch + gap), swatch))
    });
    let wheel = strips
        .iter()
        .find(|s| s.highlight)
        .map(|s| make_wheel((radius * 0.5, radius), &s.colors))
        .unwrap_or_default();
    let center = (width + gap + radius, radius);
    let wheel = wheel.into_iter().fold(
        Group::new().set("transform", format!("translate({} {})", center.0, center.1)),
        |group, path| group.add(path),
    );

    document
        .add(wheel)
        .set("viewBox", (0.0, 0.0, width + gap + 2.0 * radius, height))
}
