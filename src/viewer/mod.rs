//! Log sessions and their HTTP API.
//!
//! The `getquotes` binary writes a JSON-lines log; this module
//! post-processes it into [`Session`]s — one per program run, delimited by
//! the start/end markers — and serves them over HTTP for the `viewlog`
//! binary.

mod server;
mod sessions;

pub use server::router;
pub use sessions::{
    load_sessions, load_sessions_from_path, LogEvent, Session, Sessions, ViewerError,
    SESSION_END, SESSION_START,
};
