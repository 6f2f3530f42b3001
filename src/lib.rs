//! On-demand HLS streaming server — index a local video library and serve it
//! as MPEG-TS segments transcoded on first request.

pub mod cli;
pub mod config;
pub mod http;
pub mod media;
pub mod stream;
