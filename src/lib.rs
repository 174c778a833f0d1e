//! Page annotator: a per-page image editor with movable text boxes and a
//! freehand paint mask.

pub mod app;
pub mod editor;
pub mod error;
pub mod fit;
pub mod mask;
pub mod model;
pub mod store;

pub use app::AnnotatorApp;
pub use editor::{Editor, EditorConfig};
pub use store::DocumentStore;
