//! Library half of the `abibreaks` binary: configuration file handling.

pub mod config;
