pub mod args;

pub use args::{Arguments, IndexMode};
use clap::Parser;

pub fn parse() -> Arguments {
    Arguments::parse()
}
