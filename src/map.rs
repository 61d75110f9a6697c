//! An ordered map implemented with a threaded AVL tree.

use std::cmp::{self, Ordering};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

mod dump;
mod iter;

pub use iter::{Iter, Keys, Range, Values};

/// An ordered map implemented with a threaded AVL tree.
///
/// Nodes without a right child store a *thread* in their right slot instead:
/// a non-owning link to their in-order successor. Traversal therefore needs
/// neither parent links nor a stack.
///
/// Keys are never removed individually and inserting an existing key leaves
/// the map untouched.
///
/// ```
/// use threaded_avl::ThreadedAvlMap;
/// let mut map = ThreadedAvlMap::new();
/// map.insert(2, "two");
/// map.insert(1, "one");
/// map.insert(3, "three");
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.successor(&1), Some(&2));
/// assert_eq!(map.range_search(&2, &9), vec![2, 3]);
/// ```
pub struct ThreadedAvlMap<K, V> {
    root: Link<K, V>,
    num_nodes: usize,
    cursor: Link<K, V>,
    marker: PhantomData<Box<Node<K, V>>>,
}

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Right<K, V>,
    height: isize,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;
type Link<K, V> = Option<NodePtr<K, V>>;

/// Right slot of a node: an owned child or a thread to the in-order successor.
enum Right<K, V> {
    Child(NodePtr<K, V>),
    /// Never owns its target. `None` marks the greatest key.
    Thread(Link<K, V>),
}

impl<K, V> Clone for Right<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Right<K, V> {}

impl<K, V> Right<K, V> {
    fn child(self) -> Link<K, V> {
        match self {
            Right::Child(child_ptr) => Some(child_ptr),
            Right::Thread(_) => None,
        }
    }
}

// The map owns its nodes exclusively, same as `Box`.
unsafe impl<K: Send, V: Send> Send for ThreadedAvlMap<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for ThreadedAvlMap<K, V> {}

impl<K, V> ThreadedAvlMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
            cursor: None,
            marker: PhantomData,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree: `0` for a single node, `-1` if empty.
    pub fn height(&self) -> isize {
        match self.root {
            None => -1,
            Some(root_ptr) => unsafe { root_ptr.as_ref().height },
        }
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        debug_log!(released = self.num_nodes, "clearing map");
        self.destroy_nodes();
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// The iterator follows the thread links and uses constant extra memory.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.first_node(), self.num_nodes)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Returns the first key-value pair in the map, the one with the minimum key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.first_node().map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns the last key-value pair in the map, the one with the maximum key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node_ptr = self.root?;
        while let Right::Child(right_ptr) = unsafe { node_ptr.as_ref().right } {
            node_ptr = right_ptr;
        }
        let node = unsafe { &*node_ptr.as_ptr() };
        Some((&node.key, &node.value))
    }

    /// Positions the map's shared cursor at the smallest key.
    ///
    /// Subsequent calls to [`next_key`] yield the keys in ascending order.
    /// There is a single cursor per map: calling `begin` again restarts it.
    /// Prefer [`iter`], which keeps its own position.
    ///
    /// ```
    /// use threaded_avl::ThreadedAvlMap;
    /// let mut map: ThreadedAvlMap<_, _> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// map.begin();
    /// assert_eq!(map.next_key(), Some(&1));
    /// assert_eq!(map.next_key(), Some(&2));
    /// assert_eq!(map.next_key(), None);
    /// ```
    ///
    /// [`next_key`]: ThreadedAvlMap::next_key
    /// [`iter`]: ThreadedAvlMap::iter
    pub fn begin(&mut self) {
        self.cursor = self.first_node();
    }

    /// Returns the key under the shared cursor and advances the cursor to its
    /// in-order successor. Returns `None` once the traversal is exhausted.
    pub fn next_key(&mut self) -> Option<&K> {
        let node_ptr = self.cursor?;
        unsafe {
            self.cursor = Node::successor(node_ptr);
            Some(&(*node_ptr.as_ptr()).key)
        }
    }

    fn first_node(&self) -> Link<K, V> {
        self.root.map(|root_ptr| unsafe { Node::leftmost(root_ptr) })
    }

    // Releases every node by following owned links only.
    fn destroy_nodes(&mut self) {
        let mut stack: Vec<NodePtr<K, V>> = self.root.take().into_iter().collect();
        while let Some(node_ptr) = stack.pop() {
            unsafe {
                stack.extend(node_ptr.as_ref().left);
                if let Right::Child(right_ptr) = node_ptr.as_ref().right {
                    stack.push(right_ptr);
                }
                Node::destroy(node_ptr);
            }
        }
        self.num_nodes = 0;
        self.cursor = None;
    }
}

impl<K: Ord, V> ThreadedAvlMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns a clone of the value for the key, or `V::default()` if the key is absent.
    pub fn value_of(&self, key: &K) -> V
    where
        V: Default + Clone,
    {
        self.get(key).cloned().unwrap_or_default()
    }

    /// Returns the key following `key` in sorted order.
    ///
    /// Returns `None` if `key` is not in the map or is the greatest key.
    pub fn successor(&self, key: &K) -> Option<&K> {
        let node_ptr = self.find(key)?;
        let next_ptr = unsafe { Node::successor(node_ptr) }?;
        Some(&unsafe { &*next_ptr.as_ptr() }.key)
    }

    /// Returns a clone of the key following `key` in sorted order,
    /// or `K::default()` if there is none.
    pub fn successor_key_of(&self, key: &K) -> K
    where
        K: Default + Clone,
    {
        self.successor(key).cloned().unwrap_or_default()
    }

    /// Returns the stored height of the node holding `key`, or `-1` if absent.
    pub fn height_of(&self, key: &K) -> isize {
        self.find(key)
            .map_or(-1, |node_ptr| unsafe { node_ptr.as_ref().height })
    }

    /// Gets an iterator over the entries with keys in `lower..=upper`, in ascending order.
    ///
    /// The first entry is located with a single descent, the rest are reached
    /// over the thread links. An empty iterator is returned if `lower > upper`.
    pub fn range<'a>(&'a self, lower: &K, upper: &'a K) -> Range<'a, K, V> {
        if lower > upper {
            return Range::new(None, upper);
        }
        Range::new(self.lower_bound(lower), upper)
    }

    /// Returns all keys in `lower..=upper` in ascending order.
    /// The result is empty if no key falls into the range or if `lower > upper`.
    pub fn range_search(&self, lower: &K, upper: &K) -> Vec<K>
    where
        K: Clone,
    {
        self.range(lower, upper).map(|(key, _)| key.clone()).collect()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns false, leaving the map unchanged, if the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        // Nodes visited on the way down, bottom node last
        let mut path: Vec<NodePtr<K, V>> = Vec::new();
        let mut is_left = false;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            path.push(node_ptr);
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => {
                        trace_log!(len = self.num_nodes, "duplicate key ignored");
                        return false;
                    }
                    Ordering::Less => {
                        is_left = true;
                        node_ptr.as_ref().left
                    }
                    Ordering::Greater => {
                        is_left = false;
                        node_ptr.as_ref().right.child()
                    }
                }
            };
        }

        let mut new_ptr = Node::create(key, value);
        match path.last().copied() {
            None => self.root = Some(new_ptr),
            Some(mut parent_ptr) => unsafe {
                if is_left {
                    // Successor of a new left leaf is its parent
                    parent_ptr.as_mut().left = Some(new_ptr);
                    new_ptr.as_mut().right = Right::Thread(Some(parent_ptr));
                } else {
                    // New right leaf takes over the parent's thread
                    new_ptr.as_mut().right =
                        mem::replace(&mut parent_ptr.as_mut().right, Right::Child(new_ptr));
                }
            },
        }
        self.num_nodes += 1;
        trace_log!(len = self.num_nodes, depth = path.len(), "inserted key");

        self.rebalance_path(path);
        true
    }

    /// Walks the tree and asserts all structural invariants:
    /// ordering, AVL balance, stored heights, node count and thread targets.
    ///
    /// Panics on the first violation.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        assert_eq!(self.root.is_none(), self.num_nodes == 0);

        unsafe {
            // In-order walk over owned links only, so threads can be checked against it
            let mut inorder: Vec<NodePtr<K, V>> = Vec::with_capacity(self.num_nodes);
            let mut stack: Vec<NodePtr<K, V>> = Vec::new();
            let mut current = self.root;
            loop {
                while let Some(node_ptr) = current {
                    stack.push(node_ptr);
                    current = node_ptr.as_ref().left;
                }
                match stack.pop() {
                    None => break,
                    Some(node_ptr) => {
                        inorder.push(node_ptr);
                        current = node_ptr.as_ref().right.child();
                    }
                }
            }

            // Check number of nodes
            assert_eq!(inorder.len(), self.num_nodes);

            for (index, &node_ptr) in inorder.iter().enumerate() {
                let node = node_ptr.as_ref();
                let next = inorder.get(index + 1).copied();

                // Check ordering
                if let Some(next_ptr) = next {
                    assert!(node.key < next_ptr.as_ref().key);
                }

                // Check thread target
                if let Right::Thread(thread) = node.right {
                    assert!(thread == next);
                }

                // Check height
                let left_height = Self::left_height(node_ptr);
                let right_height = Self::right_height(node_ptr);
                assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

                // Check AVL condition (nearly balance)
                assert!(left_height <= right_height + 1);
                assert!(right_height <= left_height + 1);
            }
        }
    }

    fn find(&self, key: &K) -> Link<K, V> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right.child(),
                }
            }
        }
        current
    }

    // Node with the smallest key not less than `key`.
    fn lower_bound(&self, key: &K) -> Link<K, V> {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => return Some(node_ptr),
                    Ordering::Less => {
                        candidate = Some(node_ptr);
                        node_ptr.as_ref().left
                    }
                    Ordering::Greater => node_ptr.as_ref().right.child(),
                }
            }
        }
        candidate
    }

    fn left_height(node_ptr: NodePtr<K, V>) -> isize {
        unsafe {
            match node_ptr.as_ref().left {
                None => -1,
                Some(left_ptr) => left_ptr.as_ref().height,
            }
        }
    }

    // A thread is not a child and counts as an empty subtree.
    fn right_height(node_ptr: NodePtr<K, V>) -> isize {
        unsafe {
            match node_ptr.as_ref().right {
                Right::Thread(_) => -1,
                Right::Child(right_ptr) => right_ptr.as_ref().height,
            }
        }
    }

    fn computed_height(node_ptr: NodePtr<K, V>) -> isize {
        1 + cmp::max(Self::left_height(node_ptr), Self::right_height(node_ptr))
    }

    fn adjust_height(mut node_ptr: NodePtr<K, V>) {
        let height = Self::computed_height(node_ptr);
        unsafe {
            node_ptr.as_mut().height = height;
        }
    }

    // Makes `new_ptr` take the place of `old_ptr` below `parent` (or at the root).
    fn replace_child(
        &mut self,
        parent: Link<K, V>,
        old_ptr: NodePtr<K, V>,
        new_ptr: NodePtr<K, V>,
    ) {
        match parent {
            None => self.root = Some(new_ptr),
            Some(mut parent_ptr) => unsafe {
                if parent_ptr.as_ref().left == Some(old_ptr) {
                    parent_ptr.as_mut().left = Some(new_ptr);
                } else {
                    debug_assert!(parent_ptr.as_ref().right.child() == Some(old_ptr));
                    parent_ptr.as_mut().right = Right::Child(new_ptr);
                }
            },
        }
    }

    /// Promotes the owned right child of `node_ptr`.
    /// The rotated node is left with a thread to its new parent if it loses its right subtree.
    fn rotate_left(&mut self, parent: Link<K, V>, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            let mut right_ptr = match node_ptr.as_ref().right {
                Right::Child(right_ptr) => right_ptr,
                Right::Thread(_) => unreachable!("left rotation needs an owned right child"),
            };

            node_ptr.as_mut().right = match right_ptr.as_ref().left {
                Some(right_left_ptr) => Right::Child(right_left_ptr),
                None => Right::Thread(Some(right_ptr)),
            };
            right_ptr.as_mut().left = Some(node_ptr);
            self.replace_child(parent, node_ptr, right_ptr);

            Self::adjust_height(node_ptr);
            Self::adjust_height(right_ptr);
            trace_log!(height = right_ptr.as_ref().height, "rotated left");
        }
    }

    /// Promotes the left child of `node_ptr`, which then owns `node_ptr` as its right child.
    fn rotate_right(&mut self, parent: Link<K, V>, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            let mut left_ptr = match node_ptr.as_ref().left {
                Some(left_ptr) => left_ptr,
                None => unreachable!("right rotation needs a left child"),
            };

            // A threaded left child has no right subtree to hand over
            node_ptr.as_mut().left = left_ptr.as_ref().right.child();
            left_ptr.as_mut().right = Right::Child(node_ptr);
            self.replace_child(parent, node_ptr, left_ptr);

            Self::adjust_height(node_ptr);
            Self::adjust_height(left_ptr);
            trace_log!(height = left_ptr.as_ref().height, "rotated right");
        }
    }

    /// Fixes heights bottom-up along the insertion path.
    /// Stops as soon as a height is unchanged or after the first rotation,
    /// which is enough to restore balance after a single insert operation.
    fn rebalance_path(&mut self, mut path: Vec<NodePtr<K, V>>) {
        while let Some(mut node_ptr) = path.pop() {
            let height = Self::computed_height(node_ptr);
            unsafe {
                if height == node_ptr.as_ref().height {
                    break;
                }
                node_ptr.as_mut().height = height;
            }
            let parent = path.last().copied();
            if self.rebalance_node(parent, node_ptr) {
                break;
            }
        }
    }

    /// Restores AVL condition (balance) at given node if necessary.
    /// Initial balance must not exceed +2 or -2, which always holds after a single insert.
    /// On equal grandchild heights the single rotation is chosen.
    /// Returns whether rebalancing had been necessary.
    fn rebalance_node(&mut self, parent: Link<K, V>, node_ptr: NodePtr<K, V>) -> bool {
        let left_height = Self::left_height(node_ptr);
        let right_height = Self::right_height(node_ptr);
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Rebalance right
            if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                if Self::right_height(left_ptr) > Self::left_height(left_ptr) {
                    self.rotate_left(Some(node_ptr), left_ptr);
                }
            }
            self.rotate_right(parent, node_ptr);
            true
        } else if right_height > left_height + 1 {
            // Rebalance left
            if let Right::Child(right_ptr) = unsafe { node_ptr.as_ref().right } {
                if Self::left_height(right_ptr) > Self::right_height(right_ptr) {
                    self.rotate_right(Some(node_ptr), right_ptr);
                }
            }
            self.rotate_left(parent, node_ptr);
            true
        } else {
            false
        }
    }
}

impl<K, V> Drop for ThreadedAvlMap<K, V> {
    fn drop(&mut self) {
        self.destroy_nodes();
    }
}

impl<K, V> Default for ThreadedAvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the tree node by node, keeping its exact shape, heights and threads.
/// No rotations happen; the clone starts without an active cursor.
impl<K: Clone, V: Clone> Clone for ThreadedAvlMap<K, V> {
    fn clone(&self) -> Self {
        let mut map = Self::new();
        let Some(root_ptr) = self.root else {
            return map;
        };

        let root_copy = Node::copy(root_ptr);
        map.root = Some(root_copy);
        map.num_nodes = self.num_nodes;

        // (source, copy, successor of the copy if it ends up threaded)
        let mut stack = vec![(root_ptr, root_copy, None)];
        while let Some((node_ptr, mut copy_ptr, successor)) = stack.pop() {
            unsafe {
                if let Some(left_ptr) = node_ptr.as_ref().left {
                    let left_copy = Node::copy(left_ptr);
                    copy_ptr.as_mut().left = Some(left_copy);
                    stack.push((left_ptr, left_copy, Some(copy_ptr)));
                }
                copy_ptr.as_mut().right = match node_ptr.as_ref().right {
                    Right::Child(right_ptr) => {
                        let right_copy = Node::copy(right_ptr);
                        stack.push((right_ptr, right_copy, successor));
                        Right::Child(right_copy)
                    }
                    Right::Thread(_) => Right::Thread(successor),
                };
            }
        }
        debug_log!(copied = map.num_nodes, "cloned map");
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ThreadedAvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for ThreadedAvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Keys already present keep their first value.
impl<K: Ord, V> Extend<(K, V)> for ThreadedAvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a ThreadedAvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Node<K, V> {
    fn create(key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            left: None,
            right: Right::Thread(None),
            height: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    // Copies key, value and height; links are filled in by the caller.
    fn copy(node_ptr: NodePtr<K, V>) -> NodePtr<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let node = unsafe { node_ptr.as_ref() };
        let mut copy_ptr = Self::create(node.key.clone(), node.value.clone());
        unsafe {
            copy_ptr.as_mut().height = node.height;
        }
        copy_ptr
    }

    unsafe fn destroy(node_ptr: NodePtr<K, V>) {
        drop(Box::from_raw(node_ptr.as_ptr()));
    }

    unsafe fn leftmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        while let Some(left_ptr) = node_ptr.as_ref().left {
            node_ptr = left_ptr;
        }
        node_ptr
    }

    unsafe fn successor(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        match node_ptr.as_ref().right {
            Right::Thread(next) => next,
            Right::Child(right_ptr) => Some(Self::leftmost(right_ptr)),
        }
    }
}
