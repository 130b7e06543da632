pub mod cache;
pub mod color;
pub mod delta;
pub mod error;
pub mod palette_type;
pub mod space;
pub mod stats;
pub mod vector;

pub use cache::{Context, ConversionCache, DistanceCache};
pub use color::{sRGB, Color};
pub use delta::{Delta, Weights};
pub use error::ColorError;
pub use palette_type::PaletteType;
pub use space::ColorSpace;
pub use vector::Vector;
