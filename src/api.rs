//! Client for the remote track API.
//!
//! Track listing/detail/editing for the views, stream bytes for the audio
//! thread and the like/unlike calls used by the player.

mod client;
mod error;
mod models;

pub use client::*;
pub use error::ApiError;
pub use models::*;
