//! Edge creation and collision resolution: the insertion path.
//!
//! `follow` creates an edge on demand, relocating a sibling set through
//! `resolve` when the target cell is already owned by another parent.

use crate::callback::RelocationSink;
use crate::{DoubleArrayTrie, LeafId, Policy, TrieValue};

impl<V: TrieValue, P: Policy> DoubleArrayTrie<V, P> {
    /// Descend one edge from `from` under `label`, creating it if absent.
    /// Returns the cell reached.
    pub(crate) fn follow<CF: RelocationSink>(&mut self, from: i32, label: u8, cf: &mut CF) -> i32 {
        let base = self.array[from as usize].base();
        let guess = if base >= 0 { base ^ label as i32 } else { -1 };
        if base < 0 || self.array[guess as usize].check < 0 {
            let to = self.pop_empty(base, label, from);
            self.push_sibling(from, to ^ label as i32, label, base >= 0);
            to
        } else if self.array[guess as usize].check != from {
            let mut from_n = from;
            self.resolve(&mut from_n, base, label, cf)
        } else {
            guess
        }
    }

    /// Relocate the smaller of `from_n`'s (plus the newcomer `label_n`) or
    /// `from_p`'s child sets to a fresh base, freeing up `base_n ^ label_n`
    /// for the colliding edge. Returns the cell the newcomer now occupies.
    pub(crate) fn resolve<CF: RelocationSink>(
        &mut self,
        from_n: &mut i32,
        base_n: i32,
        label_n: u8,
        cf: &mut CF,
    ) -> i32 {
        let to_pn = base_n ^ label_n as i32;
        let from_p = self.array[to_pn as usize].check;
        let base_p = self.array[from_p as usize].base();

        let child_n = self.ninfo[*from_n as usize].child;
        let child_p = self.ninfo[from_p as usize].child;
        let flag = self.consult(base_n, base_p, child_n, child_p);

        let labels = if flag {
            self.set_child(base_n, child_n, Some(label_n))
        } else {
            self.set_child(base_p, child_p, None)
        };

        let place = if labels.len() == 1 {
            self.find_place()
        } else {
            self.find_place_for(&labels)
        };
        let base = place ^ labels[0] as i32;

        let from = if flag { *from_n } else { from_p };
        let base_ = if flag { base_n } else { base_p };

        if flag && labels[0] == label_n {
            self.ninfo[from as usize].child = label_n;
        }
        self.array[from as usize].base_ = base;

        for (i, &p) in labels.iter().enumerate() {
            let to = self.pop_empty(base, p, from);
            let to_ = base_ ^ p as i32;
            self.ninfo[to as usize].sibling = labels.get(i + 1).copied().unwrap_or(0);

            if flag && to_ == to_pn {
                continue; // the newcomer has no prior cell to move
            }
            cf.on_move(to_, to);

            let old_base = self.array[to_ as usize].base_;
            self.array[to as usize].base_ = old_base;
            if old_base > 0 && p != 0 {
                let mut c = self.ninfo[to_ as usize].child;
                self.ninfo[to as usize].child = c;
                loop {
                    let grandchild = (old_base ^ c as i32) as usize;
                    self.array[grandchild].check = to;
                    c = self.ninfo[grandchild].sibling;
                    if c == 0 {
                        break;
                    }
                }
            }

            if !flag && to_ == *from_n {
                *from_n = to;
            }
            if !flag && to_ == to_pn {
                self.push_sibling(*from_n, to_pn ^ label_n as i32, label_n, true);
                self.ninfo[to_ as usize].child = 0;
                self.array[to_ as usize].base_ = if label_n != 0 { -1 } else { 0 };
                self.array[to_ as usize].check = *from_n;
            } else {
                self.push_empty(to_);
            }
        }

        if flag {
            base ^ label_n as i32
        } else {
            to_pn
        }
    }

    /// Walk `key` from `(from, pos)`, creating edges as needed, and add
    /// `val` to the value stored at the terminal leaf. Calling with `val ==
    /// V::default()` inserts the key if absent and otherwise leaves its
    /// value untouched ("insert if absent, else touch").
    ///
    /// Panics if `key` is empty and `from == 0` (inserting the empty key at
    /// the root has no valid representation — see §4.2) or if `key`
    /// contains the reserved byte 0.
    pub fn update_with<CF: RelocationSink>(
        &mut self,
        key: &[u8],
        from: i32,
        pos: usize,
        val: V,
        cf: &mut CF,
    ) -> LeafId {
        assert!(
            !(key.is_empty() && from == 0),
            "dartrie: cannot insert a zero-length key at the root"
        );
        let mut cur = from;
        for &b in &key[pos..] {
            assert_ne!(b, 0, "dartrie: key bytes must be in 1..=255, got 0");
            cur = self.follow(cur, b, cf);
        }
        let is_new = {
            let base = self.array[cur as usize].base();
            base < 0 || self.array[(base ^ 0) as usize].check != cur
        };
        let to = self.follow(cur, 0, cf);
        let updated = self.array[to as usize].base_.wrapping_add(val.to_raw());
        self.array[to as usize].base_ = updated;
        if is_new {
            self.num_keys += 1;
        }
        LeafId(to)
    }

    /// `update_with` starting from the root with no relocation tracking.
    pub fn update(&mut self, key: &[u8], val: V) -> LeafId {
        self.update_with(key, 0, 0, val, &mut crate::callback::NoopSink)
    }

    /// Insert `key` if absent (a no-op, besides creating the path, if it is
    /// already present); returns its leaf handle.
    pub fn insert(&mut self, key: &[u8]) -> LeafId {
        self.update(key, V::default())
    }

    /// Bulk-insert `(key, value)` pairs in order (cedar's `build`).
    pub fn build<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (&'a [u8], V)>,
    {
        for (key, val) in items {
            self.update(key, val);
        }
    }
}
