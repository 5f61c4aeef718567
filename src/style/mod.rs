//! Style Module
//!
//! Built-in palettes and font families, themes, brand layers and the
//! resolver that ties them together.

pub mod palette;
mod resolver;
mod theme;

pub use palette::{ColorPalette, FontFamily};
pub use resolver::{StyleResolver, DEFAULT_THEME};
pub use theme::{BrandConfig, BrandIdentity, FontStyle, LayoutOptions, Margins, Theme};
