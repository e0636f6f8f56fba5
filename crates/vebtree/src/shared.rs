use crate::error::VebError;
use crate::snapshot::TreeSnapshot;
use crate::tree::VebTree;
use log::trace;
use parking_lot::RwLock;
use std::sync::Arc;

/// A cloneable, thread-safe handle to a [`VebTree`].
///
/// Clones share the same tree. Queries take a shared lock and mutations take an exclusive one.
/// Unlike [`VebTree::insert`], inserting through the handle never panics: out-of-range values
/// come back as [`VebError::ValueOutOfRange`].
#[derive(Debug, Clone)]
pub struct SharedVebTree {
    inner: Arc<RwLock<VebTree>>,
}

impl SharedVebTree {
    pub fn new(universe: u64) -> Result<Self, VebError> {
        Ok(Self::from_tree(VebTree::new(universe)?))
    }

    pub fn from_tree(tree: VebTree) -> Self {
        SharedVebTree {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn universe(&self) -> u64 {
        self.inner.read().universe()
    }

    pub fn len(&self) -> u64 {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains(&self, x: u64) -> bool {
        self.inner.read().contains(x)
    }

    pub fn minimum(&self) -> Option<u64> {
        self.inner.read().minimum()
    }

    pub fn maximum(&self) -> Option<u64> {
        self.inner.read().maximum()
    }

    pub fn find_next(&self, x: u64) -> Option<u64> {
        self.inner.read().find_next(x)
    }

    pub fn find_prev(&self, x: u64) -> Option<u64> {
        self.inner.read().find_prev(x)
    }

    pub fn insert(&self, x: u64) -> Result<bool, VebError> {
        self.inner.write().try_insert(x)
    }

    /// Inserts every value, returning how many were new.
    ///
    /// All values are range-checked before any is inserted, so a failed batch leaves the tree
    /// untouched.
    pub fn insert_batch(&self, values: &[u64]) -> Result<u64, VebError> {
        let mut tree = self.inner.write();
        let universe = tree.universe();
        if let Some(&value) = values.iter().find(|&&v| v >= universe) {
            return Err(VebError::ValueOutOfRange { value, universe });
        }

        let mut inserted = 0;
        for &value in values {
            if tree.try_insert(value)? {
                inserted += 1;
            }
        }
        trace!("Inserted {inserted} of {} values in batch", values.len());
        Ok(inserted)
    }

    pub fn delete(&self, x: u64) -> bool {
        self.inner.write().delete(x)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Removes and returns the smallest value.
    pub fn pop_min(&self) -> Option<u64> {
        let mut tree = self.inner.write();
        let min = tree.minimum()?;
        tree.delete(min);
        Some(min)
    }

    /// Removes and returns the largest value.
    pub fn pop_max(&self) -> Option<u64> {
        let mut tree = self.inner.write();
        let max = tree.maximum()?;
        tree.delete(max);
        Some(max)
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.inner.read().iter().collect()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.inner.read().to_snapshot()
    }

    /// Runs `f` against the tree under a single shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&VebTree) -> R) -> R {
        f(&self.inner.read())
    }

    /// Unwraps the tree when this is the last handle; otherwise hands the handle back.
    pub fn into_inner(self) -> Result<VebTree, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| SharedVebTree { inner })
    }
}
