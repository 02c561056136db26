// This is an implementation following the ideal
//
// ```
// struct BstMap<K, V> {
//     root: Option<Box<Node<K, V>>>,
//     length: usize,
// }
//
// struct Node<K, V> {
//     key: K,
//     val: V,
//     left: Option<Box<Node<K, V>>>,
//     right: Option<Box<Node<K, V>>>,
//     parent: *mut Node<K, V>,
// }
// ```
//
// A `Box` asserts unique access to its contents, which the parent back-pointers would violate,
// so the owning edges are raw handles too and ownership is tracked by convention: a node is owned
// by exactly one edge (its parent's child slot or the root), and only `Root` frees nodes.

mod node;
mod search;
pub mod error;
pub mod map;

pub use error::{Error, Result};
pub use map::BstMap;
