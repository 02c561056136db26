use core::cmp::Ordering;

use compare::Compare;

use crate::node::{BoxedNode, Root, Side};

use self::SearchResult::*;

pub enum SearchResult<K, V> {
    Found(BoxedNode<K, V>),
    /// The key is absent. Holds the empty slot where it belongs, or `None` if the tree is empty.
    GoDown(Option<(BoxedNode<K, V>, Side)>)
}

/// Descends from the root comparing `key` against each node's key with `cmp`. `Q` is `K` itself or
/// a borrowed form of it that `cmp` orders the same way.
pub fn search_tree<K, V, Q: ?Sized, C>(root: &Root<K, V>, key: &Q, cmp: &C) -> SearchResult<K, V>
    where C: Compare<Q, K>
{
    let mut node = match root.node() {
        Some(node) => node,
        None => return GoDown(None)
    };

    loop {
        let side = match cmp.compare(key, unsafe { node.key() }) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return Found(node)
        };
        match unsafe { node.child(side) } {
            Some(child) => node = child,
            None => return GoDown(Some((node, side)))
        }
    }
}
