mod code;

pub use code::{make_document, Strip};

const SWATCH: f64 = 32.0;
const GAP: f64 = SWATCH * 0.25;

pub fn save_svg<T>(path: T, strips: &[Strip]) -> Result<(), std::io::Error>
where
    T: std::convert::AsRef<std::path::Path>,
{
    let document = make_document(strips, SWATCH, GAP);

    svg::save(path, &document)
}
