// Every node is heap-allocated on its own and addressed through a `BoxedNode`, a raw handle that
// is `Copy`. The same handle type is used for the owning edges (`left`, `right`, the root) and for
// the non-owning `parent` link, so which handles own is purely a matter of convention:
//
// - a node is referenced by exactly one owning edge, either its parent's child slot or the root;
// - `parent` is `None` exactly for the node held by the root edge;
// - nodes are only freed by `Root` (`clear`, `remove`, `take_sorted`), after they have been
//   unlinked from every owning edge.
//
// All the relinking in `remove` goes through three primitives, `take_child`, `attach` and
// `Root::transplant`, which keep the parent links in step with the owning edges.

use core::cmp::{max, Ordering};
use core::marker::PhantomData;
use core::ptr::NonNull;

use compare::Compare;

use crate::error::{Error, Result};

struct Node<K, V> {
    key: K,
    val: V,
    parent: Option<BoxedNode<K, V>>,
    left: Option<BoxedNode<K, V>>,
    right: Option<BoxedNode<K, V>>,
}

#[derive(Debug)]
pub struct BoxedNode<K, V> {
    ptr: NonNull<Node<K, V>>,
    _marker: PhantomData<*mut (K, V)>
}

impl<K, V> Copy for BoxedNode<K, V> { }
impl<K, V> Clone for BoxedNode<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> PartialEq for BoxedNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}
impl<K, V> Eq for BoxedNode<K, V> { }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right
}

// The accessors below hand out references with an unbounded lifetime. Callers pick the lifetime
// from the borrow of the map they came through.
impl<K, V> BoxedNode<K, V> {
    /// Allocates a detached node: no parent, no children.
    pub fn new(key: K, val: V) -> Self {
        let node = Box::new(Node {
            key,
            val,
            parent: None,
            left: None,
            right: None
        });
        BoxedNode { ptr: NonNull::from(Box::leak(node)), _marker: PhantomData }
    }

    /// Frees the node and hands back its pair. The node must already be unlinked; its children are
    /// not touched.
    pub unsafe fn into_kv(self) -> (K, V) {
        let node = Box::from_raw(self.ptr.as_ptr());
        (node.key, node.val)
    }

    unsafe fn free(self) {
        drop(Box::from_raw(self.ptr.as_ptr()));
    }

    pub unsafe fn key<'a>(self) -> &'a K {
        &(*self.ptr.as_ptr()).key
    }

    pub unsafe fn val<'a>(self) -> &'a V {
        &(*self.ptr.as_ptr()).val
    }

    pub unsafe fn val_mut<'a>(self) -> &'a mut V {
        &mut (*self.ptr.as_ptr()).val
    }

    pub unsafe fn kv_mut<'a>(self) -> (&'a K, &'a mut V) {
        let node = &mut *self.ptr.as_ptr();
        (&node.key, &mut node.val)
    }

    pub unsafe fn parent(self) -> Option<Self> {
        (*self.ptr.as_ptr()).parent
    }

    pub unsafe fn left(self) -> Option<Self> {
        (*self.ptr.as_ptr()).left
    }

    pub unsafe fn right(self) -> Option<Self> {
        (*self.ptr.as_ptr()).right
    }

    pub unsafe fn child(self, side: Side) -> Option<Self> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right()
        }
    }

    unsafe fn slot<'a>(self, side: Side) -> &'a mut Option<Self> {
        let node = &mut *self.ptr.as_ptr();
        match side {
            Side::Left => &mut node.left,
            Side::Right => &mut node.right
        }
    }

    unsafe fn set_parent(self, parent: Option<Self>) {
        (*self.ptr.as_ptr()).parent = parent;
    }

    /// Which child slot of its parent holds this node, or `None` for the root.
    pub unsafe fn side(self) -> Option<Side> {
        self.parent().map(|parent| {
            if parent.left() == Some(self) { Side::Left } else { Side::Right }
        })
    }

    /// Leftmost node of the subtree rooted here.
    pub unsafe fn first(self) -> Self {
        let mut node = self;
        while let Some(left) = node.left() {
            node = left;
        }
        node
    }

    /// The next node in key order, found from the child and parent links alone.
    pub unsafe fn successor(self) -> Option<Self> {
        if let Some(right) = self.right() {
            return Some(right.first());
        }

        let mut node = self;
        while let Some(parent) = node.parent() {
            if parent.left() == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }
}

/// Detaches and returns the child on `side`, leaving that slot empty. The detached node keeps its
/// own subtree but no longer has a parent.
pub unsafe fn take_child<K, V>(parent: BoxedNode<K, V>, side: Side) -> Option<BoxedNode<K, V>> {
    let child = parent.slot(side).take();
    if let Some(child) = child {
        child.set_parent(None);
    }
    child
}

/// Gives ownership of `child` to `parent` on `side`. The slot must be empty.
pub unsafe fn attach<K, V>(parent: BoxedNode<K, V>, side: Side, child: Option<BoxedNode<K, V>>) {
    debug_assert!(parent.child(side).is_none());
    *parent.slot(side) = child;
    if let Some(child) = child {
        child.set_parent(Some(parent));
    }
}

/// Number of levels below and including `node`. Walks with an explicit stack, so a degenerate
/// tree does not exhaust the call stack.
pub fn height<K, V>(node: Option<BoxedNode<K, V>>) -> usize {
    let mut stack: Vec<(BoxedNode<K, V>, usize)> = node.map(|node| (node, 1)).into_iter().collect();
    let mut deepest = 0;
    while let Some((node, depth)) = stack.pop() {
        deepest = max(deepest, depth);
        unsafe {
            stack.extend(node.left().map(|child| (child, depth + 1)));
            stack.extend(node.right().map(|child| (child, depth + 1)));
        }
    }
    deepest
}

// Height of the subtree if it is balanced at every node, `None` as soon as one node is not.
// Post-order: a node is visited once to queue its children and once more to combine their heights,
// which by then sit on top of `heights` as left then right.
fn balanced_height<K, V>(node: Option<BoxedNode<K, V>>) -> Option<usize> {
    let mut stack = vec![(node, false)];
    let mut heights: Vec<usize> = Vec::new();
    while let Some((node, children_done)) = stack.pop() {
        let node = match node {
            Some(node) => node,
            None => {
                heights.push(0);
                continue;
            }
        };
        if children_done {
            let right = heights.pop()?;
            let left = heights.pop()?;
            if left.abs_diff(right) > 1 {
                return None;
            }
            heights.push(1 + max(left, right));
        } else {
            stack.push((Some(node), true));
            unsafe {
                stack.push((node.right(), false));
                stack.push((node.left(), false));
            }
        }
    }
    heights.pop()
}

/// Pushes every node at depth `level` below `node` (depth 1 being `node` itself), left to right.
pub fn collect_level<K, V>(node: Option<BoxedNode<K, V>>, level: usize, out: &mut Vec<BoxedNode<K, V>>) {
    let mut stack: Vec<(BoxedNode<K, V>, usize)> = node.map(|node| (node, 1)).into_iter().collect();
    while let Some((node, depth)) = stack.pop() {
        if depth == level {
            out.push(node);
        } else {
            unsafe {
                stack.extend(node.right().map(|child| (child, depth + 1)));
                stack.extend(node.left().map(|child| (child, depth + 1)));
            }
        }
    }
}

// Copies source and copy in lockstep. The copy is owned by a `Root` from the first node on, so a
// panicking `clone` of a key or value frees whatever was already built.
fn clone_tree<K: Clone, V: Clone>(src: Option<BoxedNode<K, V>>) -> Root<K, V> {
    let mut copy = Root::new();
    let src = match src {
        Some(src) => src,
        None => return copy
    };
    unsafe {
        let top = BoxedNode::new(src.key().clone(), src.val().clone());
        copy.node = Some(top);
        let mut stack = vec![(src, top)];
        while let Some((src, dst)) = stack.pop() {
            for side in [Side::Left, Side::Right] {
                if let Some(child) = src.child(side) {
                    let node = BoxedNode::new(child.key().clone(), child.val().clone());
                    attach(dst, side, Some(node));
                    stack.push((child, node));
                }
            }
        }
    }
    copy
}

// Median of `items` at the top, each half recursively below it. The shape is the one inserting the
// median first and then recursing on both halves would give, including a two element run ending
// up as the second element with the first as its left child.
fn build_balanced<K, V>(mut items: Vec<(K, V)>) -> Option<BoxedNode<K, V>> {
    let mid = items.len() / 2;
    let right = items.split_off(items.len().min(mid + 1));
    let (key, val) = items.pop()?;

    let node = BoxedNode::new(key, val);
    unsafe {
        attach(node, Side::Left, build_balanced(items));
        attach(node, Side::Right, build_balanced(right));
    }
    Some(node)
}

/// The owning edge at the top of the tree.
pub struct Root<K, V> {
    node: Option<BoxedNode<K, V>>,
    _owns: PhantomData<Box<Node<K, V>>>
}

unsafe impl<K: Send, V: Send> Send for Root<K, V> { }
unsafe impl<K: Sync, V: Sync> Sync for Root<K, V> { }

impl<K, V> Drop for Root<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Root<K, V> {
    pub fn new() -> Self {
        Root {
            node: None,
            _owns: PhantomData
        }
    }

    /// Builds a tree of minimal height from pairs already sorted by key.
    pub fn from_sorted(items: Vec<(K, V)>) -> Self {
        Root {
            node: build_balanced(items),
            _owns: PhantomData
        }
    }

    pub fn node(&self) -> Option<BoxedNode<K, V>> {
        self.node
    }

    pub fn first(&self) -> Option<BoxedNode<K, V>> {
        self.node.map(|node| unsafe { node.first() })
    }

    pub fn height(&self) -> usize {
        height(self.node)
    }

    pub fn is_balanced(&self) -> bool {
        balanced_height(self.node).is_some()
    }

    /// Frees every node. Iterative, so a degenerate tree does not exhaust the stack.
    pub fn clear(&mut self) {
        let mut stack: Vec<BoxedNode<K, V>> = self.node.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            unsafe {
                stack.extend(node.left());
                stack.extend(node.right());
                node.free();
            }
        }
    }

    /// Puts `new` into the slot that owns `node` (the parent's child slot, or the root edge) and
    /// gives it `node`'s parent. `node` is left unlinked from above; its own child links are
    /// untouched.
    pub unsafe fn transplant(&mut self, node: BoxedNode<K, V>, new: Option<BoxedNode<K, V>>) {
        let parent = node.parent();
        let slot = match (parent, node.side()) {
            (Some(parent), Some(side)) => parent.slot(side),
            _ => &mut self.node
        };
        *slot = new;
        if let Some(new) = new {
            new.set_parent(parent);
        }
    }

    /// Inserts a fresh node in the empty slot `pos`, or as the root when `pos` is `None`.
    pub unsafe fn insert_at(&mut self, pos: Option<(BoxedNode<K, V>, Side)>, key: K, val: V) -> BoxedNode<K, V> {
        let node = BoxedNode::new(key, val);
        match pos {
            Some((parent, side)) => attach(parent, side, Some(node)),
            None => {
                debug_assert!(self.node.is_none());
                self.node = Some(node);
            }
        }
        node
    }

    /// Unlinks `node` from the tree and frees it, returning its pair.
    ///
    /// With two children the in-order successor is moved, not copied, into `node`'s position, so
    /// every other node keeps its address and its pair.
    pub unsafe fn remove(&mut self, node: BoxedNode<K, V>) -> (K, V) {
        match (node.left(), node.right()) {
            (None, None) => self.transplant(node, None),
            (Some(child), None) | (None, Some(child)) => self.transplant(node, Some(child)),
            (Some(left), Some(right)) => {
                let succ = right.first();
                if succ != right {
                    // `succ` is a left child with no left subtree of its own.
                    let succ_right = take_child(succ, Side::Right);
                    self.transplant(succ, succ_right);
                    attach(succ, Side::Right, Some(right));
                }
                attach(succ, Side::Left, Some(left));
                self.transplant(node, Some(succ));
            }
        }
        node.into_kv()
    }

    /// Moves every pair out in key order, walking the successor links, and leaves the tree empty.
    pub fn take_sorted(&mut self, len: usize) -> Vec<(K, V)> {
        let mut nodes = Vec::with_capacity(len);
        let mut cur = self.first();
        while let Some(node) = cur {
            nodes.push(node);
            cur = unsafe { node.successor() };
        }
        self.node = None;
        nodes.into_iter().map(|node| unsafe { node.into_kv() }).collect()
    }

    /// Walks the whole tree and reports the first broken invariant, otherwise the node count.
    pub fn check<C: Compare<K>>(&self, cmp: &C) -> Result<usize> {
        let root = match self.node {
            Some(root) => root,
            None => return Ok(0)
        };

        unsafe {
            if root.parent().is_some() {
                return Err(Error::Corrupted("root has a parent"));
            }

            let mut count = 0;
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                count += 1;
                for child in node.left().into_iter().chain(node.right()) {
                    if child.parent() != Some(node) {
                        return Err(Error::Corrupted("child does not link back to its parent"));
                    }
                    stack.push(child);
                }
            }

            let mut seen = 1;
            let mut prev = root.first();
            while let Some(next) = prev.successor() {
                if cmp.compare(prev.key(), next.key()) != Ordering::Less {
                    return Err(Error::Corrupted("keys out of order"));
                }
                seen += 1;
                prev = next;
            }
            if seen != count {
                return Err(Error::Corrupted("in-order walk misses nodes"));
            }

            Ok(count)
        }
    }
}

impl<K: Clone, V: Clone> Clone for Root<K, V> {
    fn clone(&self) -> Self {
        clone_tree(self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compare::natural;

    // Hand-built tree from a list of keys, inserted without any rebalancing.
    fn tree(keys: &[i32]) -> Root<i32, i32> {
        let mut root = Root::new();
        for &key in keys {
            let mut pos = None;
            let mut cur = root.node();
            while let Some(node) = cur {
                let side = if key < unsafe { *node.key() } { Side::Left } else { Side::Right };
                pos = Some((node, side));
                cur = unsafe { node.child(side) };
            }
            unsafe { root.insert_at(pos, key, key * 10); }
        }
        root
    }

    fn keys(root: &Root<i32, i32>) -> Vec<i32> {
        let mut out = Vec::new();
        let mut cur = root.first();
        while let Some(node) = cur {
            unsafe {
                out.push(*node.key());
                cur = node.successor();
            }
        }
        out
    }

    fn find(root: &Root<i32, i32>, key: i32) -> BoxedNode<i32, i32> {
        let mut cur = root.node();
        while let Some(node) = cur {
            let k = unsafe { *node.key() };
            if k == key {
                return node;
            }
            cur = unsafe { if key < k { node.left() } else { node.right() } };
        }
        panic!("{} not in tree", key);
    }

    const SAMPLE: [i32; 9] = [8, 3, 6, 1, 10, 7, 14, 4, 13];

    #[test]
    fn successor_walks_in_order() {
        let root = tree(&SAMPLE);
        assert_eq!(keys(&root), vec![1, 3, 4, 6, 7, 8, 10, 13, 14]);
        assert_eq!(root.check(&natural()), Ok(9));
    }

    #[test]
    fn successor_of_last_is_none() {
        let root = tree(&SAMPLE);
        assert!(unsafe { find(&root, 14).successor() }.is_none());
        assert_eq!(unsafe { find(&root, 7).successor() }, Some(find(&root, 8)));
    }

    #[test]
    fn take_and_attach_keep_parent_links() {
        let root = tree(&SAMPLE);
        let six = find(&root, 6);
        unsafe {
            let four = take_child(six, Side::Left).unwrap();
            assert!(four.parent().is_none());
            assert!(six.left().is_none());
            assert_eq!(root.check(&natural()), Ok(8));

            attach(six, Side::Left, Some(four));
            assert_eq!(four.parent(), Some(six));
            assert_eq!(four.side(), Some(Side::Left));
        }
        assert_eq!(root.check(&natural()), Ok(9));
    }

    #[test]
    fn transplant_at_root() {
        let mut root = tree(&[2, 1]);
        let two = root.node().unwrap();
        unsafe {
            let one = take_child(two, Side::Left);
            root.transplant(two, one);
            assert_eq!(root.node(), one);
            assert!(one.unwrap().parent().is_none());
            two.into_kv();
        }
        assert_eq!(keys(&root), vec![1]);
    }

    #[test]
    fn remove_leaf() {
        let mut root = tree(&SAMPLE);
        let four = find(&root, 4);
        assert_eq!(unsafe { root.remove(four) }, (4, 40));
        assert_eq!(keys(&root), vec![1, 3, 6, 7, 8, 10, 13, 14]);
        assert_eq!(root.check(&natural()), Ok(8));
    }

    #[test]
    fn remove_single_child_splices() {
        let mut root = tree(&SAMPLE);
        let ten = find(&root, 10);
        let fourteen = find(&root, 14);
        unsafe { root.remove(ten); }
        assert_eq!(unsafe { root.node().unwrap().right() }, Some(fourteen));
        assert_eq!(root.check(&natural()), Ok(8));
    }

    #[test]
    fn remove_two_children_moves_successor_node() {
        let mut root = tree(&SAMPLE);
        let three = find(&root, 3);
        let four = find(&root, 4);
        unsafe {
            root.remove(three);
            assert_eq!(root.node().unwrap().left(), Some(four));
            assert_eq!(*four.val(), 40);
            assert_eq!(four.left().map(|n| *n.key()), Some(1));
            assert_eq!(four.right().map(|n| *n.key()), Some(6));
        }
        assert_eq!(keys(&root), vec![1, 4, 6, 7, 8, 10, 13, 14]);
        assert_eq!(root.check(&natural()), Ok(8));
    }

    #[test]
    fn remove_root_with_successor_as_right_child() {
        let mut root = tree(&[2, 1, 3, 4]);
        let three = find(&root, 3);
        unsafe { root.remove(root.node().unwrap()); }
        assert_eq!(root.node(), Some(three));
        assert_eq!(keys(&root), vec![1, 3, 4]);
        assert_eq!(root.check(&natural()), Ok(3));
    }

    #[test]
    fn remove_root_with_deep_successor() {
        let mut root = tree(&[5, 2, 9, 7, 6, 8, 10]);
        let six = find(&root, 6);
        unsafe { root.remove(root.node().unwrap()); }
        assert_eq!(root.node(), Some(six));
        assert_eq!(keys(&root), vec![2, 6, 7, 8, 9, 10]);
        assert_eq!(root.check(&natural()), Ok(6));
    }

    #[test]
    fn successor_right_child_is_reattached() {
        let mut root = tree(&[5, 2, 9, 7, 8]);
        let eight = find(&root, 8);
        let nine = find(&root, 9);
        unsafe {
            root.remove(root.node().unwrap());
            assert_eq!(nine.left(), Some(eight));
            assert_eq!(eight.parent(), Some(nine));
        }
        assert_eq!(keys(&root), vec![2, 7, 8, 9]);
        assert_eq!(root.check(&natural()), Ok(4));
    }

    #[test]
    fn from_sorted_is_median_split() {
        let root: Root<i32, i32> = Root::from_sorted(vec![(1, 1), (2, 2)]);
        unsafe {
            assert_eq!(*root.node().unwrap().key(), 2);
            assert_eq!(root.node().unwrap().left().map(|n| *n.key()), Some(1));
        }

        let root: Root<i32, i32> = Root::from_sorted((0..7).map(|i| (i, i)).collect());
        assert_eq!(unsafe { *root.node().unwrap().key() }, 3);
        assert_eq!(root.height(), 3);
        assert!(root.is_balanced());
        assert_eq!(root.check(&natural()), Ok(7));
    }

    #[test]
    fn take_sorted_empties() {
        let mut root = tree(&SAMPLE);
        let pairs = root.take_sorted(9);
        assert_eq!(pairs.first(), Some(&(1, 10)));
        assert_eq!(pairs.len(), 9);
        assert!(root.node().is_none());
    }

    #[test]
    fn clone_rewires_parents() {
        let root = tree(&SAMPLE);
        let copy = root.clone();
        assert_eq!(keys(&copy), keys(&root));
        assert_eq!(copy.check(&natural()), Ok(9));
        assert!(copy.node() != root.node());
    }

    #[test]
    fn levels() {
        let root = tree(&SAMPLE);
        let mut out = Vec::new();
        collect_level(root.node(), 3, &mut out);
        let keys: Vec<i32> = out.iter().map(|n| unsafe { *n.key() }).collect();
        assert_eq!(keys, vec![1, 6, 14]);
        assert_eq!(root.height(), 4);
        assert!(!root.is_balanced());
    }

    #[test]
    fn balance_is_checked_below_the_root() {
        // The root's subtrees are 2 and 3 high, but 6 has only a right chain of two.
        let root = tree(&[4, 2, 6, 1, 7, 8]);
        assert_eq!(root.height(), 4);
        assert_eq!(balanced_height(root.node()), None);

        let root = tree(&[4, 2, 6, 1, 3, 5, 7, 8]);
        assert_eq!(balanced_height(root.node()), Some(4));
        assert_eq!(balanced_height::<i32, i32>(None), Some(0));
        assert_eq!(height::<i32, i32>(None), 0);
    }
}
