use crate::error::VebError;
use crate::iter::Iter;
use log::{debug, trace};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::{Bound, RangeBounds};

/// A van Emde Boas tree over the integers `0..universe`.
///
/// The tree stores a set of `u64` values below a fixed upper bound, the *universe size*, chosen
/// when the tree is created. The bound is exclusive: a tree with universe 10 stores `0..=9`.
///
/// Membership, insertion, deletion, successor and predecessor queries all run in
/// `O(log log U)` time, where `U` is the universe size. Their cost does not depend on how many
/// elements are stored, and it grows extremely slowly with the universe: a tree able to hold
/// every 64-bit value is only about twice as slow as one holding every 32-bit value.
///
/// Child clusters are allocated lazily, so memory is proportional to the number of stored
/// elements rather than to the universe size.
///
/// ```rust
/// use vebtree::VebTree;
///
/// let mut tree = VebTree::new(1 << 20).unwrap();
/// tree.insert(42);
/// tree.insert(7);
/// tree.insert(1000);
///
/// assert_eq!(tree.find_next(42), Some(1000));
/// assert_eq!(tree.find_prev(42), Some(7));
/// assert_eq!(tree.iter().collect::<Vec<_>>(), vec![7, 42, 1000]);
/// ```
#[derive(Debug, Clone)]
pub struct VebTree {
    universe: u64,
    len: u64,
    root: Node,
}

// A node covers 2^bits values. Its minimum lives only here and is never pushed down into a
// cluster; every other element is stored in the cluster picked by its high bits.
#[derive(Debug, Clone)]
struct Node {
    bits: u32,
    min: Option<u64>,
    max: Option<u64>,
    summary: Option<Box<Node>>,
    clusters: HashMap<u64, Node>,
}

impl Node {
    fn new(bits: u32) -> Self {
        Node {
            bits,
            min: None,
            max: None,
            summary: None,
            clusters: HashMap::new(),
        }
    }

    fn singleton(bits: u32, x: u64) -> Self {
        let mut node = Node::new(bits);
        node.min = Some(x);
        node.max = Some(x);
        node
    }

    fn low_bits(&self) -> u32 {
        self.bits / 2
    }

    fn high(&self, x: u64) -> u64 {
        x >> self.low_bits()
    }

    fn low(&self, x: u64) -> u64 {
        x & ((1u64 << self.low_bits()) - 1)
    }

    fn index(&self, high: u64, low: u64) -> u64 {
        (high << self.low_bits()) | low
    }

    fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    fn is_leaf(&self) -> bool {
        self.bits == 1
    }

    fn contains(&self, x: u64) -> bool {
        if self.min == Some(x) || self.max == Some(x) {
            return true;
        }
        if self.is_leaf() {
            return false;
        }
        self.clusters
            .get(&self.high(x))
            .is_some_and(|cluster| cluster.contains(self.low(x)))
    }

    fn successor(&self, x: u64) -> Option<u64> {
        if self.is_leaf() {
            return if x == 0 && self.max == Some(1) {
                Some(1)
            } else {
                None
            };
        }
        match self.min {
            None => return None,
            Some(min) if x < min => return Some(min),
            Some(_) => {}
        }

        let (high, low) = (self.high(x), self.low(x));
        if let Some(cluster) = self.clusters.get(&high) {
            if cluster.max.is_some_and(|max| low < max) {
                return cluster.successor(low).map(|next| self.index(high, next));
            }
        }

        let next_high = self.summary.as_ref()?.successor(high)?;
        self.clusters
            .get(&next_high)?
            .min
            .map(|min| self.index(next_high, min))
    }

    fn predecessor(&self, x: u64) -> Option<u64> {
        if self.is_leaf() {
            return if x == 1 && self.min == Some(0) {
                Some(0)
            } else {
                None
            };
        }
        match self.max {
            None => return None,
            Some(max) if x > max => return Some(max),
            Some(_) => {}
        }

        let (high, low) = (self.high(x), self.low(x));
        if let Some(cluster) = self.clusters.get(&high) {
            if cluster.min.is_some_and(|min| low > min) {
                return cluster.predecessor(low).map(|prev| self.index(high, prev));
            }
        }

        match self.summary.as_ref().and_then(|s| s.predecessor(high)) {
            Some(prev_high) => self
                .clusters
                .get(&prev_high)?
                .max
                .map(|max| self.index(prev_high, max)),
            // The minimum is not stored in any cluster.
            None => self.min.filter(|&min| min < x),
        }
    }

    // Caller guarantees x is absent.
    fn insert(&mut self, x: u64) {
        let Some(min) = self.min else {
            self.min = Some(x);
            self.max = Some(x);
            return;
        };

        let mut x = x;
        if x < min {
            self.min = Some(x);
            x = min;
        }

        if !self.is_leaf() {
            let (high, low) = (self.high(x), self.low(x));
            let cluster_bits = self.low_bits();
            let summary_bits = self.bits - cluster_bits;
            match self.clusters.entry(high) {
                Entry::Occupied(mut cluster) => cluster.get_mut().insert(low),
                Entry::Vacant(slot) => {
                    self.summary
                        .get_or_insert_with(|| Box::new(Node::new(summary_bits)))
                        .insert(high);
                    slot.insert(Node::singleton(cluster_bits, low));
                }
            }
        }

        if self.max.is_none_or(|max| x > max) {
            self.max = Some(x);
        }
    }

    // Caller guarantees x is present.
    fn delete(&mut self, x: u64) {
        if self.min == self.max {
            self.min = None;
            self.max = None;
            return;
        }

        if self.is_leaf() {
            // Both 0 and 1 are present; keep the other one.
            let remaining = x ^ 1;
            self.min = Some(remaining);
            self.max = Some(remaining);
            return;
        }

        let mut x = x;
        if self.min == Some(x) {
            // Promote the smallest clustered element, then remove it from its cluster below.
            let Some(first) = self.first_clustered() else {
                self.min = None;
                self.max = None;
                return;
            };
            x = first;
            self.min = Some(first);
        }

        let (high, low) = (self.high(x), self.low(x));
        let cluster_emptied = match self.clusters.get_mut(&high) {
            Some(cluster) => {
                cluster.delete(low);
                cluster.is_empty()
            }
            None => return,
        };

        if cluster_emptied {
            self.clusters.remove(&high);
            if let Some(summary) = self.summary.as_mut() {
                summary.delete(high);
                if summary.is_empty() {
                    self.summary = None;
                }
            }
        }

        if self.max == Some(x) {
            self.max = self.last_clustered().or(self.min);
        }
    }

    fn first_clustered(&self) -> Option<u64> {
        let high = self.summary.as_ref()?.min?;
        self.clusters
            .get(&high)?
            .min
            .map(|min| self.index(high, min))
    }

    fn last_clustered(&self) -> Option<u64> {
        let high = self.summary.as_ref()?.max?;
        self.clusters
            .get(&high)?
            .max
            .map(|max| self.index(high, max))
    }
}

impl VebTree {
    /// Creates an empty tree storing values in `0..universe`.
    ///
    /// # Errors
    ///
    /// Returns [`VebError::UniverseTooSmall`] when the universe size is 0 or 1. Van Emde Boas
    /// trees have a minimum universe size of 2.
    pub fn new(universe: u64) -> Result<Self, VebError> {
        if universe < 2 {
            return Err(VebError::UniverseTooSmall { universe });
        }
        let bits = u64::BITS - (universe - 1).leading_zeros();
        trace!("Creating vEB tree with universe {universe} ({bits} bits)");
        Ok(VebTree {
            universe,
            len: 0,
            root: Node::new(bits),
        })
    }

    /// Creates a tree and inserts every value from `values`.
    ///
    /// Fails on the first value outside `0..universe`.
    pub fn with_values<I>(universe: u64, values: I) -> Result<Self, VebError>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut tree = VebTree::new(universe)?;
        for value in values {
            tree.try_insert(value)?;
        }
        Ok(tree)
    }

    /// Returns the lowest value stored in the tree, or `None` if the tree is empty.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// assert_eq!(tree.minimum(), None);
    ///
    /// tree.insert(4);
    /// tree.insert(6);
    /// assert_eq!(tree.minimum(), Some(4));
    /// ```
    ///
    /// # Runtime
    /// `O(1)`
    pub fn minimum(&self) -> Option<u64> {
        self.root.min
    }

    /// Returns the highest value stored in the tree, or `None` if the tree is empty.
    ///
    /// # Runtime
    /// `O(1)`
    pub fn maximum(&self) -> Option<u64> {
        self.root.max
    }

    /// Returns the universe size, one larger than the largest value the tree can store.
    pub fn universe(&self) -> u64 {
        self.universe
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Returns true if the tree contains `x`. Values outside the universe are never contained.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// tree.insert(5);
    /// assert!(tree.contains(5));
    /// assert!(!tree.contains(6));
    /// assert!(!tree.contains(500));
    /// ```
    ///
    /// # Runtime
    /// `O(log log U)`
    pub fn contains(&self, x: u64) -> bool {
        x < self.universe && self.root.contains(x)
    }

    /// Finds the smallest stored value strictly greater than `x`.
    ///
    /// `x` does not have to be in the tree.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// tree.insert(5);
    /// assert_eq!(tree.find_next(2), Some(5));
    /// assert_eq!(tree.find_next(5), None);
    /// ```
    ///
    /// # Runtime
    /// `O(log log U)`
    pub fn find_next(&self, x: u64) -> Option<u64> {
        if x >= self.universe - 1 {
            return None;
        }
        self.root.successor(x)
    }

    /// Finds the largest stored value strictly less than `x`.
    ///
    /// `x` does not have to be in the tree, nor inside the universe; any `x` past the universe
    /// yields the maximum.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// tree.insert(5);
    /// assert_eq!(tree.find_prev(8), Some(5));
    /// assert_eq!(tree.find_prev(5), None);
    /// ```
    ///
    /// # Runtime
    /// `O(log log U)`
    pub fn find_prev(&self, x: u64) -> Option<u64> {
        if x >= self.universe {
            return self.maximum();
        }
        self.root.predecessor(x)
    }

    /// Inserts `x`, returning `true` if it was not already present.
    ///
    /// # Panics
    ///
    /// Panics if `x` is greater than or equal to the universe size. Use
    /// [`try_insert`](Self::try_insert) to get an error instead.
    ///
    /// # Runtime
    /// `O(log log U)`
    pub fn insert(&mut self, x: u64) -> bool {
        match self.try_insert(x) {
            Ok(inserted) => inserted,
            Err(e) => panic!("{e}"),
        }
    }

    /// Inserts `x`, returning `Ok(true)` if it was not already present.
    ///
    /// # Errors
    ///
    /// Returns [`VebError::ValueOutOfRange`] if `x` is outside the universe.
    pub fn try_insert(&mut self, x: u64) -> Result<bool, VebError> {
        if x >= self.universe {
            return Err(VebError::ValueOutOfRange {
                value: x,
                universe: self.universe,
            });
        }
        if self.root.contains(x) {
            return Ok(false);
        }
        self.root.insert(x);
        self.len += 1;
        Ok(true)
    }

    /// Removes `x`, returning `true` if it was present.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// tree.insert(4);
    /// assert!(tree.delete(4));
    /// assert!(!tree.contains(4));
    /// assert!(!tree.delete(4));
    /// ```
    ///
    /// # Runtime
    /// `O(log log U)`
    pub fn delete(&mut self, x: u64) -> bool {
        if !self.contains(x) {
            return false;
        }
        self.root.delete(x);
        self.len -= 1;
        true
    }

    /// Removes every value, keeping the universe size.
    pub fn clear(&mut self) {
        debug!(
            "Clearing vEB tree with universe {} holding {} values",
            self.universe, self.len
        );
        self.root = Node::new(self.root.bits);
        self.len = 0;
    }

    /// Iterates over the stored values in ascending order.
    ///
    /// The iterator is double-ended, so `tree.iter().rev()` walks in descending order. References
    /// to a `VebTree` also implement `IntoIterator`:
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let mut tree = VebTree::new(10).unwrap();
    /// tree.extend([5, 2, 4]);
    ///
    /// let ascending: Vec<u64> = (&tree).into_iter().collect();
    /// assert_eq!(ascending, vec![2, 4, 5]);
    /// let descending: Vec<u64> = tree.iter().rev().collect();
    /// assert_eq!(descending, vec![5, 4, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self, self.minimum(), self.maximum())
    }

    /// Iterates over the stored values inside `range`, in ascending order.
    ///
    /// ```rust
    /// # use vebtree::VebTree;
    /// let tree = VebTree::with_values(100, [3, 10, 20, 30, 99]).unwrap();
    /// assert_eq!(tree.range(10..30).collect::<Vec<_>>(), vec![10, 20]);
    /// assert_eq!(tree.range(11..=30).collect::<Vec<_>>(), vec![20, 30]);
    /// assert_eq!(tree.range(..).rev().next(), Some(99));
    /// ```
    pub fn range<R: RangeBounds<u64>>(&self, range: R) -> Iter<'_> {
        let front = match range.start_bound() {
            Bound::Included(&start) if self.contains(start) => Some(start),
            Bound::Included(&start) => self.find_next(start),
            Bound::Excluded(&start) => self.find_next(start),
            Bound::Unbounded => self.minimum(),
        };
        let back = match range.end_bound() {
            Bound::Included(&end) if self.contains(end) => Some(end),
            Bound::Included(&end) => self.find_prev(end),
            Bound::Excluded(&end) => self.find_prev(end),
            Bound::Unbounded => self.maximum(),
        };
        Iter::new(self, front, back)
    }
}

impl PartialEq for VebTree {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe && self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for VebTree {}

impl<'a> IntoIterator for &'a VebTree {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<u64> for VebTree {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
