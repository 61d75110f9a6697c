//! An ordered map implemented with a threaded AVL tree.
//!
//! Every node lacking a right child keeps a thread to its in-order successor
//! in that slot, so in-order traversal and range queries walk the tree with
//! constant extra memory, without parent links or a stack.
//!
//! Keys can be inserted but not removed, and a key is stored at most once.
//!
//! ```
//! use threaded_avl::ThreadedAvlMap;
//!
//! let mut map = ThreadedAvlMap::new();
//! for key in [100, 80, 60] {
//!     map.insert(key, -key);
//! }
//! assert_eq!(map.len(), 3);
//! assert_eq!(map.height(), 1);
//! assert_eq!(map.height_of(&80), 1);
//! assert_eq!(map.get(&60), Some(&-60));
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), [60, 80, 100]);
//! ```
//!
//! # Features
//!
//! - `consistency_check`: exports `ThreadedAvlMap::check_consistency`.
//! - `tracing`: emits `tracing` events on insertion, rotation, clone and clear.

#[macro_use]
mod tracing_helpers;

pub mod map;
pub use map::ThreadedAvlMap;
