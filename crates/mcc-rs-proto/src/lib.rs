//! Classic protocol (version 7) and CPE packet definitions, framing and
//! chunked level transmission.

pub mod codec;
pub mod error;
pub mod extensions;
pub mod frame;
pub mod level_stream;
pub mod packets;
pub mod types;
