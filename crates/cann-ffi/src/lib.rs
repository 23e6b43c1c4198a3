//! C ABI for cann networks
//!
//! The exported symbols live in [`c_bindings`]; `build.rs` generates
//! `include/cann.h` from them with cbindgen.

#![warn(clippy::all)]

pub mod c_bindings;

pub use c_bindings::CannNetwork;
