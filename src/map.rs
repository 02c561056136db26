use std::fmt::{self, Debug, Display};
use std::io::{self, Write};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Index;
use std::vec;

use compare::{natural, Compare, Natural};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::node::{self, BoxedNode};
use crate::search;

use crate::search::SearchResult::*;


/// An ordered map based on a plain (unbalanced) binary search tree.
///
/// Every entry lives in its own heap-allocated node. Each node owns its two children and keeps a
/// non-owning link to its parent, which is what lets a cursor step to the next key without any
/// auxiliary stack: iteration, lookup and insertion allocate nothing beyond the inserted node.
///
/// The tree never rebalances on its own. Inserting keys in sorted order degrades it to a list of
/// height `n`; call [`balance`](BstMap::balance) to rebuild it to minimal height when that
/// matters. `balance` is a no-op if every node already has subtrees whose heights differ by at
/// most one.
///
/// Keys are ordered by a comparator `C`, the natural `Ord` order by default. Any
/// [`Compare`](compare::Compare) works, including closures `Fn(&K, &K) -> Ordering` and reversed
/// orders:
///
/// ```
/// use bst_rewrite::BstMap;
/// use compare::{natural, Compare};
///
/// let mut map = BstMap::with_comparator(natural().rev());
/// map.insert(1, "a");
/// map.insert(3, "c");
/// map.insert(2, "b");
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, [3, 2, 1]);
/// ```
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key, as determined by the comparator, changes while it is in the map.
pub struct BstMap<K, V, C: Compare<K> = Natural<K>> {
    root: node::Root<K, V>,
    length: usize,
    cmp: C
}

/// A read-only position in a `BstMap`: an entry, or the end of the sequence.
///
/// Two cursors are equal when they point at the same entry, or are both at the end.
pub struct Cursor<'a, K: 'a, V: 'a> {
    node: Option<BoxedNode<K, V>>,
    _marker: PhantomData<(&'a K, &'a V)>
}

/// A position in a `BstMap` through which the value can be modified.
pub struct CursorMut<'a, K: 'a, V: 'a> {
    node: Option<BoxedNode<K, V>>,
    _marker: PhantomData<(&'a K, &'a mut V)>
}

/// An iterator over a BstMap's entries.
pub struct Iter<'a, K: 'a, V: 'a> {
    front: Option<BoxedNode<K, V>>,
    length: usize,
    _marker: PhantomData<(&'a K, &'a V)>
}

/// A mutable iterator over a BstMap's entries.
pub struct IterMut<'a, K: 'a, V: 'a> {
    front: Option<BoxedNode<K, V>>,
    length: usize,
    _marker: PhantomData<(&'a K, &'a mut V)>
}

/// An iterator over a BstMap's keys.
pub struct Keys<'a, K: 'a, V: 'a> {
    inner: Iter<'a, K, V>
}

/// An iterator over a BstMap's values.
pub struct Values<'a, K: 'a, V: 'a> {
    inner: Iter<'a, K, V>
}

/// An owning iterator over a BstMap's entries.
pub struct IntoIter<K, V> {
    inner: vec::IntoIter<(K, V)>
}

unsafe impl<'a, K: Sync, V: Sync> Send for Cursor<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Sync> Sync for Cursor<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Send> Send for CursorMut<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Sync> Sync for CursorMut<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Sync> Send for Iter<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Sync> Sync for Iter<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Send> Send for IterMut<'a, K, V> { }
unsafe impl<'a, K: Sync, V: Sync> Sync for IterMut<'a, K, V> { }

impl<K: Ord, V> BstMap<K, V> {
    /// Makes a new empty BstMap ordered by the keys' `Ord` implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// map.insert(1, "a");
    /// ```
    pub fn new() -> Self {
        BstMap::with_comparator(natural())
    }
}

impl<K: Ord, V> Default for BstMap<K, V> {
    fn default() -> Self {
        BstMap::new()
    }
}

impl<K, V, C: Compare<K>> BstMap<K, V, C> {
    /// Makes a new empty BstMap ordered by `cmp`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// assert_eq!(map.begin().key(), Some(&2));
    /// ```
    pub fn with_comparator(cmp: C) -> Self {
        BstMap {
            root: node::Root::new(),
            length: 0,
            cmp
        }
    }

    /// The comparator that orders this map's keys.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Clears the map, removing all values.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut a = BstMap::new();
    /// a.insert(1, "a");
    /// a.clear();
    /// assert!(a.is_empty());
    /// ```
    pub fn clear(&mut self) {
        trace!("clearing {} entries", self.length);
        self.root.clear();
        self.length = 0;
    }

    /// Returns a cursor at the entry for `key`, or the end cursor if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.find(&1).value(), Some(&"a"));
    /// assert_eq!(map.find(&2), map.end());
    /// ```
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Cursor<'_, K, V> where C: Compare<Q, K> {
        match search::search_tree(&self.root, key, &self.cmp) {
            Found(node) => Cursor::new(Some(node)),
            GoDown(_) => self.end()
        }
    }

    /// Returns a mutable cursor at the entry for `key`, or the end cursor if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.find_mut(&1).value_mut() {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    pub fn find_mut<Q: ?Sized>(&mut self, key: &Q) -> CursorMut<'_, K, V> where C: Compare<Q, K> {
        match search::search_tree(&self.root, key, &self.cmp) {
            Found(node) => CursorMut::new(Some(node)),
            GoDown(_) => CursorMut::new(None)
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, as long as the comparator orders
    /// the borrowed form the same way as the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    /// use compare::{natural, Compare};
    ///
    /// let mut map: BstMap<String, i32, _> = BstMap::with_comparator(natural::<str>().borrowing());
    /// map.insert("Azza".to_string(), 1);
    /// assert_eq!(map.get("Azza"), Some(&1));
    /// assert_eq!(map.get(&"Azza".to_string()), Some(&1));
    /// assert_eq!(map.get("Giulia"), None);
    /// ```
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V> where C: Compare<Q, K> {
        self.find(key).value()
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V> where C: Compare<Q, K> {
        self.find_mut(key).into_value_mut()
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool where C: Compare<Q, K> {
        !self.find(key).is_end()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns a cursor at the entry for `key` and whether the pair was inserted. If the key was
    /// already present the map is left untouched, the existing value is *not* overwritten, and the
    /// cursor points at the existing entry.
    ///
    /// The tree is not rebalanced.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// assert!(map.insert(5, 5).1);
    ///
    /// let (cursor, inserted) = map.insert(5, 99);
    /// assert!(!inserted);
    /// assert_eq!(cursor.value(), Some(&5));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (CursorMut<'_, K, V>, bool) {
        match search::search_tree(&self.root, &key, &self.cmp) {
            Found(node) => (CursorMut::new(Some(node)), false),
            GoDown(pos) => {
                let node = unsafe { self.root.insert_at(pos, key, value) };
                self.length += 1;
                (CursorMut::new(Some(node)), true)
            }
        }
    }

    /// Builds the pair from anything convertible into `K` and `V`, then behaves like `insert`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map: BstMap<String, String> = BstMap::new();
    /// map.emplace("Azza", "Abdalghani");
    /// assert_eq!(map[&"Azza".to_string()], "Abdalghani");
    /// ```
    pub fn emplace<A, B>(&mut self, key: A, value: B) -> (CursorMut<'_, K, V>, bool) where A: Into<K>, B: Into<V> {
        self.insert(key.into(), value.into())
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key is absent.
    ///
    /// This is the map's subscript operation: although it reads like a lookup, a miss *adds an
    /// entry* and grows the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map: BstMap<f64, f64, _> = BstMap::with_comparator(|a: &f64, b: &f64| a.total_cmp(b));
    /// *map.get_or_default(1.5) += 1.5;
    /// assert_eq!(map.get_or_default(3.4), &0.0);
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn get_or_default(&mut self, key: K) -> &mut V where V: Default {
        match search::search_tree(&self.root, &key, &self.cmp) {
            Found(node) => unsafe { node.val_mut() },
            GoDown(pos) => {
                let node = unsafe { self.root.insert_at(pos, key, V::default()) };
                self.length += 1;
                unsafe { node.val_mut() }
            }
        }
    }

    /// Removes the entry for `key` and returns its pair.
    ///
    /// A node with two children is replaced by its in-order successor: the successor's node is
    /// relinked into the removed node's position, so its key and value stay where they were in
    /// memory.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the map has no such key. The map is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::{BstMap, Error};
    ///
    /// let mut map = BstMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.erase(&1), Ok((1, "a")));
    /// assert_eq!(map.erase(&1), Err(Error::KeyNotFound));
    /// ```
    pub fn erase<Q: ?Sized>(&mut self, key: &Q) -> Result<(K, V)> where C: Compare<Q, K> {
        match search::search_tree(&self.root, key, &self.cmp) {
            Found(node) => {
                self.length -= 1;
                Ok(unsafe { self.root.remove(node) })
            }
            GoDown(_) => {
                debug!("erase: key not found among {} entries", self.length);
                Err(Error::KeyNotFound)
            }
        }
    }

    /// Removes a key from the map, returning the value at the key if the key was previously in
    /// the map.
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<V> where C: Compare<Q, K> {
        self.erase(key).ok().map(|(_, value)| value)
    }

    /// Returns true if, at every node, the heights of the two subtrees differ by at most one.
    pub fn check_balance(&self) -> bool {
        self.root.is_balanced()
    }

    /// Rebuilds the tree to minimal height, `ceil(log2(len + 1))`, unless it is already balanced.
    ///
    /// The entries are moved out in key order and reassembled by repeatedly taking the median of
    /// each run as the root of its subtree. Cursors do not survive a rebuild, which the borrow on
    /// `self` enforces.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map: BstMap<_, _> = (0..7).map(|i| (i, i)).collect();
    /// assert_eq!(map.height(), 7);
    /// map.balance();
    /// assert_eq!(map.height(), 3);
    /// assert!(map.check_balance());
    /// ```
    pub fn balance(&mut self) {
        if self.check_balance() {
            trace!("balance: already balanced, height {}", self.root.height());
            return;
        }

        let before = self.root.height();
        let items = self.root.take_sorted(self.length);
        self.root = node::Root::from_sorted(items);
        debug!("balance: rebuilt {} entries, height {} -> {}", self.length, before, self.root.height());
    }

    /// Number of nodes on the longest path from the root to a leaf; 0 for an empty map.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    /// Cursor at the smallest key, or the end cursor if the map is empty.
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.root.first())
    }

    /// The end cursor, one past the largest key.
    pub fn end(&self) -> Cursor<'_, K, V> {
        Cursor::new(None)
    }

    /// Same as `begin`.
    pub fn cbegin(&self) -> Cursor<'_, K, V> {
        self.begin()
    }

    /// Same as `end`.
    pub fn cend(&self) -> Cursor<'_, K, V> {
        self.end()
    }

    /// Mutable cursor at the smallest key.
    pub fn begin_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::new(self.root.first())
    }

    /// Gets an iterator over the entries of the map, in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// map.insert(3, "c");
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    ///
    /// let (first_key, first_value) = map.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            front: self.root.first(),
            length: self.length,
            _marker: PhantomData
        }
    }

    /// Gets a mutable iterator over the entries of the map, in ascending key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            front: self.root.first(),
            length: self.length,
            _marker: PhantomData
        }
    }

    /// Gets an iterator over the keys of the map, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// The entries in level order: the root, then every node at depth 2 from left to right, and so
    /// on.
    ///
    /// Each level is found by descending from the root again, so this is `O(n * height)`. It is
    /// meant for inspecting the shape of the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// for k in [2, 1, 3] {
    ///     map.insert(k, ());
    /// }
    /// let keys: Vec<_> = map.bfs().into_iter().map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [2, 1, 3]);
    /// ```
    pub fn bfs(&self) -> Vec<(&K, &V)> {
        let mut nodes = Vec::with_capacity(self.length);
        for level in 1..=self.height() {
            node::collect_level(self.root.node(), level, &mut nodes);
        }
        nodes.into_iter().map(|node| unsafe { (node.key(), node.val()) }).collect()
    }

    /// Verifies order, parent links and the cached length.
    pub fn check_invariants(&self) -> Result<()> {
        let count = self.root.check(&self.cmp)?;
        if count != self.length {
            return Err(Error::Corrupted("length does not match the number of nodes"));
        }
        Ok(())
    }
}

impl<K, V: Debug, C: Compare<K>> BstMap<K, V, C> {
    /// Writes the values level by level, one line per depth.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut nodes = Vec::new();
        for level in 1..=self.height() {
            nodes.clear();
            node::collect_level(self.root.node(), level, &mut nodes);
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    write!(out, " ")?;
                }
                write!(out, "{:?}", unsafe { node.val() })?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl<K: Clone, V: Clone, C: Compare<K> + Clone> Clone for BstMap<K, V, C> {
    fn clone(&self) -> Self {
        BstMap {
            root: self.root.clone(),
            length: self.length,
            cmp: self.cmp.clone()
        }
    }
}

impl<K: Debug, V: Debug, C: Compare<K>> Debug for BstMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Prints the values in ascending key order, separated by single spaces.
impl<K, V: Display, C: Compare<K>> Display for BstMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, value) in self.values().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

impl<K: PartialEq, V: PartialEq, C: Compare<K>> PartialEq for BstMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C: Compare<K>> Eq for BstMap<K, V, C> { }

impl<'a, K, V, C, Q: ?Sized> Index<&'a Q> for BstMap<K, V, C> where C: Compare<K> + Compare<Q, K> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present. Use `get_or_default` to insert on a miss.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = BstMap::new();
        map.extend(iter);
        map
    }
}

/// Inserts every pair; like `insert`, a key already present keeps its value.
impl<K, V, C: Compare<K>> Extend<(K, V)> for BstMap<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: 'a, V: 'a, C: Compare<K>> IntoIterator for &'a BstMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K: 'a, V: 'a, C: Compare<K>> IntoIterator for &'a mut BstMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, C: Compare<K>> IntoIterator for BstMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        let items = self.root.take_sorted(self.length);
        self.length = 0;
        IntoIter { inner: items.into_iter() }
    }
}

impl<'a, K: 'a, V: 'a> Cursor<'a, K, V> {
    fn new(node: Option<BoxedNode<K, V>>) -> Self {
        Cursor { node, _marker: PhantomData }
    }

    /// True for the end cursor.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// The entry's key, `None` at the end.
    pub fn key(&self) -> Option<&'a K> {
        self.node.map(|node| unsafe { node.key() })
    }

    /// The entry's value, `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        self.node.map(|node| unsafe { node.val() })
    }

    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.node.map(|node| unsafe { (node.key(), node.val()) })
    }

    /// Steps to the entry with the next larger key. The end cursor stays at the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_rewrite::BstMap;
    ///
    /// let map: BstMap<_, _> = [(8, 'h'), (3, 'c'), (10, 'j')].into_iter().collect();
    /// let mut cursor = map.find(&3);
    /// cursor.move_next();
    /// assert_eq!(cursor.key(), Some(&8));
    /// cursor.move_next();
    /// cursor.move_next();
    /// assert_eq!(cursor, map.end());
    /// ```
    pub fn move_next(&mut self) {
        if let Some(node) = self.node {
            self.node = unsafe { node.successor() };
        }
    }

    /// A cursor at the entry with the next larger key, leaving this one where it is.
    pub fn next_cursor(&self) -> Self {
        let mut next = *self;
        next.move_next();
        next
    }
}

impl<'a, K, V> Copy for Cursor<'a, K, V> { }
impl<'a, K, V> Clone for Cursor<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V> PartialEq for Cursor<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
impl<'a, K, V> Eq for Cursor<'a, K, V> { }

impl<'a, K: Debug, V: Debug> Debug for Cursor<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

impl<'a, K: 'a, V: 'a> CursorMut<'a, K, V> {
    fn new(node: Option<BoxedNode<K, V>>) -> Self {
        CursorMut { node, _marker: PhantomData }
    }

    /// True for the end cursor.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// The entry's key, `None` at the end.
    pub fn key(&self) -> Option<&K> {
        self.node.map(|node| unsafe { node.key() })
    }

    /// The entry's value, `None` at the end.
    pub fn value(&self) -> Option<&V> {
        self.node.map(|node| unsafe { node.val() })
    }

    pub fn key_value(&self) -> Option<(&K, &V)> {
        self.node.map(|node| unsafe { (node.key(), node.val()) })
    }

    /// The entry's value, mutably. Keys are never handed out mutably.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.node.map(|node| unsafe { node.val_mut() })
    }

    /// Converts the cursor into a mutable reference to its value, for the whole borrow of the map.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        self.node.map(|node| unsafe { node.val_mut() })
    }

    /// Like `into_value_mut`, but also yields the key.
    pub fn into_key_value_mut(self) -> Option<(&'a K, &'a mut V)> {
        self.node.map(|node| unsafe { node.kv_mut() })
    }

    /// Steps to the entry with the next larger key. The end cursor stays at the end.
    pub fn move_next(&mut self) {
        if let Some(node) = self.node {
            self.node = unsafe { node.successor() };
        }
    }

    /// Consumes the cursor and returns one at the entry with the next larger key.
    pub fn next_cursor(mut self) -> Self {
        self.move_next();
        self
    }

    /// A read-only cursor at the same position, borrowing this one.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.node)
    }
}

impl<'a, K: Debug, V: Debug> Debug for CursorMut<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.as_cursor().key_value()).finish()
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let node = self.front?;
        self.front = unsafe { node.successor() };
        self.length -= 1;
        Some(unsafe { (node.key(), node.val()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.length, Some(self.length))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> { }
impl<'a, K: 'a, V: 'a> FusedIterator for Iter<'a, K, V> { }

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            front: self.front,
            length: self.length,
            _marker: PhantomData
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        let node = self.front?;
        self.front = unsafe { node.successor() };
        self.length -= 1;
        Some(unsafe { node.kv_mut() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.length, Some(self.length))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for IterMut<'a, K, V> { }
impl<'a, K: 'a, V: 'a> FusedIterator for IterMut<'a, K, V> { }

impl<'a, K: 'a, V: 'a> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Keys<'a, K, V> { }
impl<'a, K: 'a, V: 'a> FusedIterator for Keys<'a, K, V> { }

impl<'a, K: 'a, V: 'a> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Values<'a, K, V> { }
impl<'a, K: 'a, V: 'a> FusedIterator for Values<'a, K, V> { }

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> { }
impl<K, V> FusedIterator for IntoIter<K, V> { }
