//! File-system collaborators: import scanning and surface parsing

pub mod languages;
pub mod scanner;
pub mod surface;


pub use languages::{extract_surface, ExtractedSurface, SurfaceLanguage};
pub use scanner::ImportScanner;
pub use surface::SurfaceParser;
