//! One record per 256-cell block: empty-cell count, the block's place in
//! the doubly-linked empty ring, and the soft-reject bookkeeping that lets
//! `find_place` skip blocks known to be too full for a given child-set width.

use crate::node::Node;
use crate::ninfo::NodeInfo;
use crate::{DoubleArrayTrie, Policy, TrieValue};

/// How the node array grows once the current span of blocks is exhausted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Let the backing `Vec` amortize growth (its own doubling discipline).
    Doubling,
    /// Reserve `n` blocks (`n * 256` cells) at a time, bounding worst-case
    /// over-allocation at the cost of more frequent reallocation.
    ExactFit(usize),
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Block {
    pub prev: i32,
    pub next: i32,
    pub num: i16,
    pub reject: i16,
    pub trial: i32,
    pub ehead: i32,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            prev: 0,
            next: 0,
            num: 256,
            reject: 257,
            trial: 0,
            ehead: 0,
        }
    }
}

/// Which of the three block classifications (§3.1) a list operation targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ListId {
    Full,
    Closed,
    Open,
}

impl<V: TrieValue, P: Policy> DoubleArrayTrie<V, P> {
    pub(crate) fn head(&self, list: ListId) -> Option<i32> {
        match list {
            ListId::Full => self.head_full,
            ListId::Closed => self.head_closed,
            ListId::Open => self.head_open,
        }
    }

    fn set_head(&mut self, list: ListId, v: Option<i32>) {
        match list {
            ListId::Full => self.head_full = v,
            ListId::Closed => self.head_closed = v,
            ListId::Open => self.head_open = v,
        }
    }

    pub(crate) fn pop_block(&mut self, bi: i32, list: ListId) {
        let is_last = self.block[bi as usize].next == bi;
        if is_last {
            self.set_head(list, None);
        } else {
            let (prev, next) = (self.block[bi as usize].prev, self.block[bi as usize].next);
            self.block[prev as usize].next = next;
            self.block[next as usize].prev = prev;
            if self.head(list) == Some(bi) {
                self.set_head(list, Some(next));
            }
        }
    }

    pub(crate) fn push_block(&mut self, bi: i32, list: ListId) {
        match self.head(list) {
            None => {
                self.block[bi as usize].prev = bi;
                self.block[bi as usize].next = bi;
                self.set_head(list, Some(bi));
            }
            Some(head) => {
                let tail = self.block[head as usize].prev;
                self.block[bi as usize].prev = tail;
                self.block[bi as usize].next = head;
                self.block[tail as usize].next = bi;
                self.block[head as usize].prev = bi;
                self.set_head(list, Some(bi));
            }
        }
    }

    pub(crate) fn transfer_block(&mut self, bi: i32, from: ListId, to: ListId) {
        self.pop_block(bi, from);
        self.push_block(bi, to);
    }

    /// Append a fresh 256-cell block, pre-linked as an empty ring, and place
    /// it on the Open list. Returns the new block's index.
    pub(crate) fn add_block(&mut self) -> i32 {
        let old_size = self.array.len() as i32;
        let bi = old_size >> 8;
        if let GrowthPolicy::ExactFit(chunk) = P::GROWTH {
            let chunk_cells = chunk as i32 * 256;
            if chunk_cells > 0 && old_size % chunk_cells == 0 {
                self.array.reserve_exact(chunk_cells as usize);
                self.ninfo.reserve_exact(chunk_cells as usize);
                self.block.reserve_exact(chunk);
            }
        }
        for i in 0..256i32 {
            let prev = if i == 0 { 255 } else { i - 1 };
            let next = if i == 255 { 0 } else { i + 1 };
            self.array
                .push(Node::empty_link(old_size + prev, old_size + next));
            self.ninfo.push(NodeInfo::default());
        }
        self.block.push(Block {
            ehead: old_size,
            ..Block::default()
        });
        self.push_block(bi, ListId::Open);
        bi
    }
}
