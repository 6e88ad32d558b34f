//! External inputs: the bug-report dataset and the candidate source tree.

mod dataset;
mod repo;

pub use dataset::{BugDataset, BugReport};
pub use repo::{SourceTree, Workspace};
