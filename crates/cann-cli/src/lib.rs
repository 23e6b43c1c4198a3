//! cann CLI crate
//!
//! Command-line front end over `cann-runtime` and `cann-storage`:
//!
//! - `create`: build a `.pcn` file from a TOML description, a logic-gate
//!   preset or blank dimensions, optionally with random weights.
//! - `run`: load a network, clamp inputs, run ticks and print outputs.
//! - `inspect`: header, partition layout and activation-function statistics.
//! - `export`: write the `.rnn` embedded image.
//! - `bench`: time a random network across worker counts.
//!
//! The binary (src/main.rs) wires up logging and argument parsing and calls
//! [`CannCli::execute`]; the command modules are exposed here so they can be
//! driven from tests without a subprocess.

pub mod commands;
pub mod config;
pub mod description;
pub mod error;
pub mod presets;

pub use commands::CannCli;
