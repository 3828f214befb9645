//! Free-list management: `pop_empty`/`push_empty` move cells between "in
//! use" and a block's empty ring; `find_place`/`find_place_for` search the
//! Closed/Open lists (then allocate a new block) for somewhere to land a
//! new edge or an entire relocated child set.

use crate::block::ListId;
use crate::ninfo::NodeInfo;
use crate::node::Node;
use crate::{DoubleArrayTrie, Policy, TrieValue};

impl<V: TrieValue, P: Policy> DoubleArrayTrie<V, P> {
    /// Claim an empty cell to host the edge `from --label--> ?`. If `base`
    /// (the parent's current base) is negative the parent has no outgoing
    /// edges yet and a fresh place is located via `find_place`; otherwise
    /// the target cell is already determined by `base ^ label`.
    pub(crate) fn pop_empty(&mut self, base: i32, label: u8, from: i32) -> i32 {
        let e = if base < 0 {
            self.find_place()
        } else {
            base ^ label as i32
        };
        let bi = e >> 8;
        self.block[bi as usize].num -= 1;
        if self.block[bi as usize].num == 0 {
            self.transfer_block(bi, ListId::Closed, ListId::Full);
        } else {
            let e_check = self.array[e as usize].check;
            let e_base = self.array[e as usize].base_;
            self.array[(-e_base) as usize].check = e_check;
            self.array[(-e_check) as usize].base_ = e_base;
            if e == self.block[bi as usize].ehead {
                self.block[bi as usize].ehead = -e_check;
            }
            if self.block[bi as usize].num == 1 && self.block[bi as usize].trial != P::MAX_TRIAL {
                self.transfer_block(bi, ListId::Open, ListId::Closed);
            }
        }
        self.array[e as usize].base_ = if label != 0 { -1 } else { 0 };
        self.array[e as usize].check = from;
        if base < 0 {
            self.array[from as usize].base_ = e ^ label as i32;
        }
        e
    }

    /// Return cell `e` to its block's empty ring.
    pub(crate) fn push_empty(&mut self, e: i32) {
        let bi = e >> 8;
        self.block[bi as usize].num += 1;
        if self.block[bi as usize].num == 1 {
            self.block[bi as usize].ehead = e;
            self.array[e as usize] = Node::empty_link(e, e);
            self.transfer_block(bi, ListId::Full, ListId::Closed);
        } else {
            let prev = self.block[bi as usize].ehead;
            let next = -self.array[prev as usize].check;
            self.array[e as usize] = Node::empty_link(prev, next);
            self.array[prev as usize].check = -e;
            self.array[next as usize].base_ = -e;
            if self.block[bi as usize].num == 2 || self.block[bi as usize].trial == P::MAX_TRIAL {
                self.transfer_block(bi, ListId::Closed, ListId::Open);
            }
            self.block[bi as usize].trial = 0;
        }
        if e == 0 {
            // slot 0 is the root and is never truly free; compensate the count.
            self.block[bi as usize].num -= 1;
        }
        let num = self.block[bi as usize].num as usize;
        if self.block[bi as usize].reject < self.reject[num] {
            self.block[bi as usize].reject = self.reject[num];
        }
        self.ninfo[e as usize] = NodeInfo::default();
    }

    /// Locate any empty cell to host a single new child (no sibling
    /// constraints to satisfy besides the cell itself being free).
    pub(crate) fn find_place(&mut self) -> i32 {
        if let Some(bc) = self.head(ListId::Closed) {
            return self.block[bc as usize].ehead;
        }
        if let Some(bo) = self.head(ListId::Open) {
            return self.block[bo as usize].ehead;
        }
        self.add_block() << 8
    }

    /// Locate a cell `e` such that `e ^ labels[0]` is a valid base under
    /// which every label in `labels` addresses a currently-empty cell.
    pub(crate) fn find_place_for(&mut self, labels: &[u8]) -> i32 {
        if let Some(start_bi) = self.head(ListId::Open) {
            let bz = self.block[start_bi as usize].prev;
            let nc = labels.len() as i16;
            let mut bi = start_bi;
            loop {
                if self.block[bi as usize].num >= nc && nc < self.block[bi as usize].reject {
                    let mut e = self.block[bi as usize].ehead;
                    loop {
                        let base = e ^ labels[0] as i32;
                        let fits = labels[1..]
                            .iter()
                            .all(|&l| self.array[(base ^ l as i32) as usize].check < 0);
                        if fits {
                            self.block[bi as usize].ehead = e;
                            return e;
                        }
                        let next = -self.array[e as usize].check;
                        if next == self.block[bi as usize].ehead {
                            break;
                        }
                        e = next;
                    }
                }
                self.block[bi as usize].reject = nc;
                let num = self.block[bi as usize].num as usize;
                if self.block[bi as usize].reject < self.reject[num] {
                    self.reject[num] = self.block[bi as usize].reject;
                }
                let bi_next = self.block[bi as usize].next;
                self.block[bi as usize].trial += 1;
                if self.block[bi as usize].trial == P::MAX_TRIAL {
                    self.transfer_block(bi, ListId::Open, ListId::Closed);
                }
                if bi == bz {
                    break;
                }
                bi = bi_next;
            }
        }
        self.add_block() << 8
    }
}
