//! Types stored in the per-browser session.

pub mod session;

pub use session::keys as session_keys;
