//! Command-line interface of the demo binary

mod args;

pub use args::Args;
