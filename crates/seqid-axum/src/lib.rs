#![doc = include_str!("../README.md")]

pub mod header;
pub mod log;
pub mod service;

pub use header::{DEFAULT_ID_HEADER, HeaderId, HeaderIdRejection, IdHeaderName, parse_header_id};
pub use log::{BodyLogLimit, log_exchange};
pub use service::{AppState, router};
// Public re-export so the server binary and downstream crates share one
// `seqid` version.
pub use seqid;
