//! Document lifecycle: issuance, per-user views and rendering

mod manager;
pub mod render;

pub use manager::DocumentManager;
pub use render::{DocumentRenderer, RenderedDocument, TextRenderer};
