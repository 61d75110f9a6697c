//! Iterators over a [`ThreadedAvlMap`](super::ThreadedAvlMap).
//!
//! All iterators walk the thread links, so each holds a single node link
//! and borrows the map for its whole lifetime.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::{Link, Node};

/// An iterator over the entries of a map, sorted by key.
///
/// This `struct` is created by the [`iter`] method on [`ThreadedAvlMap`].
///
/// [`ThreadedAvlMap`]: super::ThreadedAvlMap
/// [`iter`]: super::ThreadedAvlMap::iter
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

/// An iterator over the keys of a map, in sorted order.
pub struct Keys<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// An iterator over the values of a map, in order by key.
pub struct Values<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// An iterator over the entries of a map within an inclusive key range.
///
/// This `struct` is created by the [`range`] method on [`ThreadedAvlMap`].
///
/// [`ThreadedAvlMap`]: super::ThreadedAvlMap
/// [`range`]: super::ThreadedAvlMap::range
pub struct Range<'a, K, V> {
    next: Link<K, V>,
    upper: &'a K,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(first: Link<K, V>, len: usize) -> Self {
        Self {
            next: first,
            remaining: len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.next?;
        unsafe {
            self.next = Node::successor(node_ptr);
            self.remaining -= 1;
            let node = &*node_ptr.as_ptr();
            Some((&node.key, &node.value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            next: self.next,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

// Iterators only hand out shared references to keys and values.
unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

impl<'a, K, V> Keys<'a, K, V> {
    pub(super) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Values<'a, K, V> {
    pub(super) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Range<'a, K, V> {
    pub(super) fn new(first: Link<K, V>, upper: &'a K) -> Self {
        Self {
            next: first,
            upper,
            marker: PhantomData,
        }
    }
}

impl<'a, K: Ord, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.next?;
        let node = unsafe { &*node_ptr.as_ptr() };
        if node.key > *self.upper {
            self.next = None;
            return None;
        }
        self.next = unsafe { Node::successor(node_ptr) };
        Some((&node.key, &node.value))
    }
}

impl<K: Ord, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            next: self.next,
            upper: self.upper,
            marker: PhantomData,
        }
    }
}

unsafe impl<K: Sync, V: Sync> Send for Range<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Range<'_, K, V> {}
