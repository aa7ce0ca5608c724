//! Shell-facing transport: NDJSON protocol and the stdio bridge.

pub mod protocol;
pub mod stdio;
