//! Session state
//!
//! In-memory, process-wide store of the last intent and plan per session.

mod error;
mod store;

pub use error::SessionError;
pub use store::SessionStore;
