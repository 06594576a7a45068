//! tabforge CLI library.
//!
//! Song file loading, service configuration, logging setup, HTTP clients for
//! the MIDI source and the tablature writer, and the command implementations
//! behind the `tabforge` binary.

pub mod commands;
pub mod config;
pub mod input;
pub mod logging;
pub mod services;
