//! Stylemix CLI library.

pub mod cli;
