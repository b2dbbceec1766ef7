//! Building blocks shared by the missionlink server and client.
//!
//! - `protocol`: the commands exchanged over the WebSocket connection
//! - `time`: clock abstraction used for join times and ban windows
//! - `logger`: tracing subscriber setup for both binaries

pub mod logger;
pub mod protocol;
pub mod time;
