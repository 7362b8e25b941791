//! Application module: the model behind the TUI.
//!
//! `App` lives in `app::model` and holds the catalog view, selection,
//! screen and the few flags the renderer needs.

mod model;

pub use model::*;
