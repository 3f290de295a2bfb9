pub mod bio;
pub mod cli;
pub mod core;

pub use crate::core::guide_tree::{GuideTree, GuideTreeBuilder};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DendrosortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate tree: {0}")]
    DegenerateTree(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, DendrosortError>;
