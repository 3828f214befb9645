//! Read-only view over a caller-owned node array, mirroring cedar's
//! `set_array` borrowed-buffer mode (§5 read-only mode): the trie never
//! frees or reallocates the slice it was built from, and exposes only the
//! query surface (no `update`/`erase`) since mutation would have nowhere
//! safe to relocate cells into.
//!
//! `ninfo` (child/sibling bytes) is not part of the borrowed buffer's
//! format — only raw node records are — so it is rebuilt once, up front,
//! by the same linear scan [`crate::DoubleArrayTrie::load`] uses.

use std::marker::PhantomData;

use crate::ninfo::NodeInfo;
use crate::node::Node;
use crate::query::{PredictMatch, PrefixMatch};
use crate::{LeafId, TrieValue, NO_PATH, NO_VALUE};

/// A double-array trie that borrows its node array rather than owning it.
///
/// Build one over a `&[Node]` slice obtained however the caller likes (a
/// `mmap`'d [`crate::DoubleArrayTrie::save`] file, a slice carved out of a
/// larger buffer, ...). Only lookups and traversals are available; there is
/// no `insert`/`erase` because this type holds no free lists to relocate
/// into and no ownership to grow.
pub struct BorrowedTrie<'a, V: TrieValue = i32> {
    array: &'a [Node],
    ninfo: Vec<NodeInfo>,
    _value: PhantomData<V>,
}

fn push_sibling_ordered(ninfo: &mut [NodeInfo], from: i32, base: i32, label: u8, flag: bool) {
    let from_idx = from as usize;
    let mut at_child = true;
    let mut ptr_idx = from_idx;
    let mut c = ninfo[from_idx].child;
    if flag && label > c {
        loop {
            ptr_idx = (base ^ c as i32) as usize;
            at_child = false;
            c = ninfo[ptr_idx].sibling;
            if !(c != 0 && c < label) {
                break;
            }
        }
    }
    ninfo[(base ^ label as i32) as usize].sibling = c;
    if at_child {
        ninfo[ptr_idx].child = label;
    } else {
        ninfo[ptr_idx].sibling = label;
    }
}

impl<'a, V: TrieValue> BorrowedTrie<'a, V> {
    /// Wrap `array` for read-only use, rebuilding sibling-list bookkeeping
    /// by a single linear pass (same reconstruction as
    /// [`crate::DoubleArrayTrie::load`]).
    pub fn from_borrowed_nodes(array: &'a [Node]) -> Self {
        let mut ninfo = vec![NodeInfo::default(); array.len()];
        let mut has_child = vec![false; array.len()];
        for i in 1..array.len() as i32 {
            if array[i as usize].check < 0 {
                continue;
            }
            let from = array[i as usize].check;
            if from < 0 || from as usize >= array.len() {
                continue;
            }
            let base = array[from as usize].base_;
            if base < 0 {
                continue;
            }
            let label = (base ^ i) as u8;
            push_sibling_ordered(&mut ninfo, from, base, label, has_child[from as usize]);
            has_child[from as usize] = true;
        }
        Self {
            array,
            ninfo,
            _value: PhantomData,
        }
    }

    fn base(&self, i: i32) -> i32 {
        self.array[i as usize].base_
    }

    /// Walk `key` from `(*from, *pos)`; see
    /// [`crate::DoubleArrayTrie::traverse`] for the contract.
    pub fn traverse(&self, key: &[u8], from: &mut i32, pos: &mut usize) -> i32 {
        let mut cur = *from;
        while *pos < key.len() {
            let base = self.base(cur);
            if base < 0 {
                return NO_PATH;
            }
            let to = base ^ key[*pos] as i32;
            if to < 0 || to as usize >= self.array.len() || self.array[to as usize].check != cur {
                return NO_PATH;
            }
            cur = to;
            *pos += 1;
        }
        *from = cur;
        let base = self.base(cur);
        if base < 0 {
            return NO_PATH;
        }
        let to = base;
        if self.array[to as usize].check != cur {
            return NO_VALUE;
        }
        V::from_raw(self.array[to as usize].base_).to_raw()
    }

    /// The value stored at `key`, or `None` if absent.
    pub fn exact_match(&self, key: &[u8]) -> Option<i32> {
        let mut from = 0;
        let mut pos = 0;
        match self.traverse(key, &mut from, &mut pos) {
            NO_PATH | NO_VALUE => None,
            v => Some(v),
        }
    }

    fn walk(&self, key: &[u8]) -> Option<i32> {
        let mut from = 0i32;
        for &b in key {
            let base = self.base(from);
            if base < 0 {
                return None;
            }
            let to = base ^ b as i32;
            if self.array[to as usize].check != from {
                return None;
            }
            from = to;
        }
        Some(from)
    }

    /// Every prefix of `key` that is itself a stored key, shortest first.
    pub fn common_prefix_search(&self, key: &[u8]) -> Vec<PrefixMatch> {
        let mut out = Vec::new();
        let mut from = 0i32;
        for (pos, &b) in key.iter().enumerate() {
            let base = self.base(from);
            if base < 0 {
                break;
            }
            let to = base ^ b as i32;
            if self.array[to as usize].check != from {
                break;
            }
            from = to;
            let base2 = self.base(from);
            if base2 >= 0 {
                let leaf = base2;
                if self.array[leaf as usize].check == from {
                    out.push(PrefixMatch {
                        value: self.array[leaf as usize].base_,
                        length: pos + 1,
                    });
                }
            }
        }
        out
    }

    /// Every stored key for which `key` is a prefix, in subtree order.
    pub fn common_prefix_predict(&self, key: &[u8]) -> Vec<PredictMatch> {
        let Some(root) = self.walk(key) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut path = Vec::new();
        let (mut value, mut from) = self.begin(root, &mut path);
        while value != NO_PATH {
            let leaf = self.base(from);
            out.push(PredictMatch {
                value,
                length: path.len(),
                leaf: LeafId(leaf),
            });
            let (v2, f2) = self.next(from, root, &mut path);
            value = v2;
            from = f2;
        }
        out
    }

    /// Descend to the first key in the subtree rooted at `root`, label order.
    pub fn begin(&self, root: i32, path: &mut Vec<u8>) -> (i32, i32) {
        let mut from = root;
        let v = self.descend_leftmost(root, &mut from, path);
        (v, from)
    }

    /// Resume iteration after `begin`/`next`, bounded to the subtree rooted
    /// at `root`. See [`crate::DoubleArrayTrie::next`] for why `from`'s own
    /// leaf slot must be checked before climbing to its parent.
    pub fn next(&self, from: i32, root: i32, path: &mut Vec<u8>) -> (i32, i32) {
        let leaf = self.base(from);
        let mut c = self.ninfo[leaf as usize].sibling;
        let mut node = from;
        while c == 0 && node != root {
            c = self.ninfo[node as usize].sibling;
            path.pop();
            node = self.array[node as usize].check;
        }
        if c == 0 {
            return (NO_PATH, node);
        }
        path.push(c);
        let base = self.base(node);
        let child = base ^ c as i32;
        let mut f2 = node;
        let v = self.descend_leftmost(child, &mut f2, path);
        (v, f2)
    }

    fn descend_leftmost(&self, mut node: i32, from: &mut i32, path: &mut Vec<u8>) -> i32 {
        loop {
            let base = self.base(node);
            if base < 0 {
                return NO_PATH;
            }
            let c = self.ninfo[node as usize].child;
            if c == 0 {
                let leaf = base;
                if self.array[leaf as usize].check != node {
                    return NO_PATH;
                }
                *from = node;
                return self.array[leaf as usize].base_;
            }
            path.push(c);
            node = base ^ c as i32;
        }
    }

    /// Reconstruct the full key stored at `leaf`, given its length.
    pub fn suffix(&self, leaf: LeafId, len: usize) -> Vec<u8> {
        let mut key = vec![0u8; len];
        let mut to = leaf.0;
        let mut remaining = len;
        while remaining > 0 {
            remaining -= 1;
            let from = self.array[to as usize].check;
            let base = self.base(from);
            key[remaining] = (base ^ to) as u8;
            to = from;
        }
        key
    }

    /// Every stored key, in subtree order, as `(key, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, i32)> + '_ {
        let mut path = Vec::new();
        let (first_value, first_from) = self.begin(0, &mut path);
        std::iter::successors(
            Some((first_value, first_from, path)),
            move |(_, from, path)| {
                let mut path = path.clone();
                let (v, f) = self.next(*from, 0, &mut path);
                if v == NO_PATH {
                    None
                } else {
                    Some((v, f, path))
                }
            },
        )
        .take_while(|(v, _, _)| *v != NO_PATH)
        .map(|(v, _, path)| (path, v))
    }

    /// Size, in cells, of the borrowed node array.
    pub fn capacity(&self) -> usize {
        self.array.len()
    }

    /// Number of cells currently in use (`check >= 0`).
    pub fn nonzero_size(&self) -> usize {
        self.array.iter().filter(|n| n.check >= 0).count()
    }
}
