// Library root: the command-line application's modules, exposed so the
// integration tests can drive them without spawning the binary.

pub mod commands;
pub mod config;
pub mod import;
