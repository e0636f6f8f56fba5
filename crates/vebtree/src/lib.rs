//! van Emde Boas trees.
//!
//! [`VebTree`] stores a set of integers below a fixed universe size and answers membership,
//! insertion, deletion, minimum/maximum, successor and predecessor queries in `O(log log U)`
//! time. [`SharedVebTree`] wraps a tree for use across threads, and [`SnapshotFile`] persists
//! trees as JSON.

pub mod error;
pub mod iter;
pub mod shared;
pub mod snapshot;
pub mod telemetry;
pub mod tree;

pub use error::{SnapshotError, SnapshotErrorSource, VebError};
pub use iter::Iter;
pub use shared::SharedVebTree;
pub use snapshot::{SnapshotFile, TreeSnapshot};
pub use tree::VebTree;

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
