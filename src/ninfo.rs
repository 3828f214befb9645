//! Per-node `(child, sibling)` bytes maintaining ordered child lists.
//!
//! `child[i]` is the smallest label among `i`'s children (0 if none).
//! `sibling[i]` is the label of the next older sibling of `i`, threaded
//! through its *own slot under its parent's base* rather than through `i`
//! itself — see `push_sibling`/`pop_sibling` below, which is where the
//! indirection actually lives. Reconstructible from the node array alone
//! (see `crate::io::restore_ninfo`), so it is never load-bearing for
//! correctness, only for insertion speed.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{DoubleArrayTrie, Policy, TrieValue};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct NodeInfo {
    pub child: u8,
    pub sibling: u8,
}

impl<V: TrieValue, P: Policy> DoubleArrayTrie<V, P> {
    /// Insert `label` into the sorted sibling list rooted at `from`'s base.
    /// `flag` mirrors cedar's "is this node already known to have a base"
    /// guard: restoring from a raw node array calls this with a computed
    /// flag instead of always walking the full list.
    pub(crate) fn push_sibling(&mut self, from: i32, base: i32, label: u8, flag: bool) {
        let from_idx = from as usize;
        let mut at_child = true;
        let mut ptr_idx = from_idx;
        let mut c = self.ninfo[from_idx].child;
        if flag && ((P::ORDERED && label > c) || (!P::ORDERED && c == 0)) {
            loop {
                ptr_idx = (base ^ c as i32) as usize;
                at_child = false;
                c = self.ninfo[ptr_idx].sibling;
                if !(P::ORDERED && c != 0 && c < label) {
                    break;
                }
            }
        }
        self.ninfo[(base ^ label as i32) as usize].sibling = c;
        if at_child {
            self.ninfo[ptr_idx].child = label;
        } else {
            self.ninfo[ptr_idx].sibling = label;
        }
    }

    /// Remove `label` from the sorted sibling list rooted at `from`.
    pub(crate) fn pop_sibling(&mut self, from: i32, base: i32, label: u8) {
        let from_idx = from as usize;
        let mut at_child = true;
        let mut ptr_idx = from_idx;
        let mut c = self.ninfo[from_idx].child;
        while c != label {
            ptr_idx = (base ^ c as i32) as usize;
            at_child = false;
            c = self.ninfo[ptr_idx].sibling;
        }
        let next = self.ninfo[(base ^ label as i32) as usize].sibling;
        if at_child {
            self.ninfo[ptr_idx].child = next;
        } else {
            self.ninfo[ptr_idx].sibling = next;
        }
    }

    /// Walk the sibling lists of `from_n` (post-insertion of `label_n`) and
    /// `from_p` in lockstep; whichever list runs dry first is the smaller
    /// one. `true` means "relocate `from_n`'s children".
    pub(crate) fn consult(&self, base_n: i32, base_p: i32, mut c_n: u8, mut c_p: u8) -> bool {
        loop {
            c_n = self.ninfo[(base_n ^ c_n as i32) as usize].sibling;
            c_p = self.ninfo[(base_p ^ c_p as i32) as usize].sibling;
            if c_n == 0 || c_p == 0 {
                break;
            }
        }
        c_p != 0
    }

    /// Materialize the ordered label set of the children of `base`, rooted
    /// at `child`, inserting `label` at its sorted position when given.
    pub(crate) fn set_child(&self, base: i32, mut c: u8, label: Option<u8>) -> Vec<u8> {
        let mut out = Vec::with_capacity(8);
        if c == 0 {
            out.push(0);
            c = self.ninfo[(base ^ c as i32) as usize].sibling;
        }
        if P::ORDERED {
            while c != 0 && label.is_some_and(|l| c < l) {
                out.push(c);
                c = self.ninfo[(base ^ c as i32) as usize].sibling;
            }
        }
        if let Some(l) = label {
            out.push(l);
        }
        while c != 0 {
            out.push(c);
            c = self.ninfo[(base ^ c as i32) as usize].sibling;
        }
        out
    }
}
