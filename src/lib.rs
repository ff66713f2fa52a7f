//! Morpher - rewrites control attributes in templates into template control-flow.
//!
//! ```text
//! <div if="@name">#@name</div>   →   <?r if @name ?><div>#@name</div><?r end ?>
//! ```
//!
//! The [`morph::Morpher`] is the core; [`pipeline::Pipeline`] chains it with
//! other template stages and [`config::MorphConfig`] builds both from
//! `morph.toml`.

pub mod cli;
pub mod config;
pub mod logger;
pub mod morph;
pub mod pipeline;

pub use morph::{Morpher, MorphRule, MorphRules};
pub use pipeline::{Pipeline, TemplateTransform};
