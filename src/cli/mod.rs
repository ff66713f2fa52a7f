//! Command-line interface module.

mod args;
pub mod rules;
pub mod transform;

pub use args::{Cli, Commands, TransformArgs};
