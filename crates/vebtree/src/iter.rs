use crate::tree::VebTree;
use std::iter::FusedIterator;

/// A double-ended iterator over the values of a [`VebTree`], created by
/// [`VebTree::iter`] or [`VebTree::range`].
///
/// Each step is a successor (or predecessor) query, so advancing costs `O(log log U)`.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    tree: &'a VebTree,
    front: Option<u64>,
    back: Option<u64>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(tree: &'a VebTree, front: Option<u64>, back: Option<u64>) -> Self {
        match (front, back) {
            (Some(f), Some(b)) if f <= b => Iter { tree, front, back },
            _ => Iter {
                tree,
                front: None,
                back: None,
            },
        }
    }

    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front?;
        if Some(current) == self.back {
            self.finish();
        } else {
            self.front = self.tree.find_next(current);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.front.is_none() {
            return (0, Some(0));
        }
        (1, usize::try_from(self.tree.len()).ok())
    }

    fn min(mut self) -> Option<Self::Item> {
        self.next()
    }

    fn max(mut self) -> Option<Self::Item> {
        self.next_back()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.back?;
        if Some(current) == self.front {
            self.finish();
        } else {
            self.back = self.tree.find_prev(current);
        }
        Some(current)
    }
}

impl FusedIterator for Iter<'_> {}
