//! Protocol module for stream event decoding and dispatch.

mod dispatcher;
mod events;
mod parser;
mod reassembler;

pub use dispatcher::*;
pub use events::*;
pub use parser::*;
pub use reassembler::*;
