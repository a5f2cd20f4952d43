//! Transport module for opening and driving bridge streams.

mod client;
mod http;

pub use client::*;
pub use http::*;
