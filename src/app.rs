//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the track list, the
//! selection, the input mode and the last player snapshot. `app::form`
//! holds the track edit/upload form.

mod form;
mod model;

pub use form::{FormField, FormTarget, Submission, TrackForm};
pub use model::*;
