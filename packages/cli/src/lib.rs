// ABOUTME: Library side of the uieasy command-line tool
// ABOUTME: Configuration resolution, input loading, and terminal rendering used by the binary

pub mod error;
pub mod input;
pub mod render;
pub mod settings;

pub use error::{CliError, Result};

#[cfg(test)]
mod tests;
