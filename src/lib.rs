//! lapu-emu library
//!
//! Emulation of the LAPU-128 fixed-point complex vector processor.

pub mod config;
pub mod interpreter;
pub mod program;
