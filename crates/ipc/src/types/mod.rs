//! Type definitions for IPC messages.

mod lightmap;

pub use lightmap::*;
