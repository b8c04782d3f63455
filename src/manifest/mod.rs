//! Secret manifest rendering.

mod renderer;

pub use renderer::{ManifestRenderer, RenderOptions};
