//! Serialization: a compact "array-only" format that reconstructs
//! `ninfo`/`block` by a linear scan on load, and an optional sidecar that
//! persists that bookkeeping directly so `load` skips the scan.

use std::fmt;
use std::io::{self, Read, Write};

use zerocopy::{FromBytes, IntoBytes};

use crate::block::{Block, ListId};
use crate::ninfo::NodeInfo;
use crate::node::Node;
use crate::{DoubleArrayTrie, Policy, TrieValue};

const MAGIC: [u8; 4] = *b"DAT1";
const MAGIC_SIDECAR: [u8; 4] = *b"DAT2";

/// Failure modes for [`DoubleArrayTrie::save`]/[`DoubleArrayTrie::load`].
#[derive(Debug)]
pub enum TrieIoError {
    Io(io::Error),
    /// The stream ended before the header promised this many bytes.
    Truncated { expected: usize, got: usize },
    /// The magic number, or the array/sidecar length fields, didn't match
    /// what the format expects.
    SidecarMismatch,
}

impl fmt::Display for TrieIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieIoError::Io(e) => write!(f, "i/o error: {e}"),
            TrieIoError::Truncated { expected, got } => {
                write!(f, "truncated trie file: expected {expected} bytes, got {got}")
            }
            TrieIoError::SidecarMismatch => write!(f, "malformed trie file header"),
        }
    }
}

impl std::error::Error for TrieIoError {}

impl From<io::Error> for TrieIoError {
    fn from(e: io::Error) -> Self {
        TrieIoError::Io(e)
    }
}

fn read_exact_or_truncated<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), TrieIoError> {
    let mut got = 0;
    while got < buf.len() {
        let n = r.read(&mut buf[got..])?;
        if n == 0 {
            return Err(TrieIoError::Truncated {
                expected: buf.len(),
                got,
            });
        }
        got += n;
    }
    Ok(())
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64, TrieIoError> {
    let mut buf = [0u8; 8];
    read_exact_or_truncated(r, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, TrieIoError> {
    let mut buf = [0u8; 4];
    read_exact_or_truncated(r, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i16<R: Read>(r: &mut R) -> Result<i16, TrieIoError> {
    let mut buf = [0u8; 2];
    read_exact_or_truncated(r, &mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

fn write_option(w: &mut impl Write, v: Option<i32>) -> io::Result<()> {
    w.write_all(&v.unwrap_or(-1).to_le_bytes())
}

fn read_option<R: Read>(r: &mut R) -> Result<Option<i32>, TrieIoError> {
    let v = read_i32(r)?;
    Ok(if v < 0 { None } else { Some(v) })
}

impl<V: TrieValue, P: Policy> DoubleArrayTrie<V, P> {
    /// Write the raw node array only: magic, cell count, key count, then
    /// the array bytes. `load` reconstructs `ninfo`/`block` from this by a
    /// linear scan.
    pub fn save<W: Write>(&self, mut w: W) -> Result<(), TrieIoError> {
        w.write_all(&MAGIC)?;
        w.write_all(&(self.array.len() as u64).to_le_bytes())?;
        w.write_all(&(self.num_keys as u64).to_le_bytes())?;
        w.write_all(self.array.as_slice().as_bytes())?;
        Ok(())
    }

    /// Inverse of [`Self::save`]. `O(capacity)` to rebuild `ninfo`/`block`.
    pub fn load<R: Read>(mut r: R) -> Result<Self, TrieIoError> {
        let mut magic = [0u8; 4];
        read_exact_or_truncated(&mut r, &mut magic)?;
        if magic != MAGIC {
            return Err(TrieIoError::SidecarMismatch);
        }
        let len = read_u64(&mut r)? as usize;
        let num_keys = read_u64(&mut r)? as usize;
        let byte_len = len * std::mem::size_of::<Node>();
        let mut bytes = vec![0u8; byte_len];
        read_exact_or_truncated(&mut r, &mut bytes)?;
        let array: Vec<Node> = <[Node]>::ref_from_bytes(&bytes)
            .map_err(|_| TrieIoError::SidecarMismatch)?
            .to_vec();

        let mut t = Self {
            ninfo: vec![NodeInfo::default(); array.len()],
            array,
            block: Vec::new(),
            head_full: None,
            head_closed: None,
            head_open: None,
            reject: std::array::from_fn(|i| (i + 1) as i16),
            num_keys,
            _value: std::marker::PhantomData,
            _policy: std::marker::PhantomData,
        };
        t.restore_ninfo();
        t.restore_block();
        Ok(t)
    }

    /// Like [`Self::save`], but also persists `ninfo`/`block`/list-head
    /// state directly so [`Self::load_with_sidecar`] need not rescan.
    pub fn save_with_sidecar<W: Write>(&self, mut w: W) -> Result<(), TrieIoError> {
        w.write_all(&MAGIC_SIDECAR)?;
        w.write_all(&(self.array.len() as u64).to_le_bytes())?;
        w.write_all(&(self.num_keys as u64).to_le_bytes())?;
        w.write_all(self.array.as_slice().as_bytes())?;
        w.write_all(self.ninfo.as_slice().as_bytes())?;
        write_option(&mut w, self.head_full)?;
        write_option(&mut w, self.head_closed)?;
        write_option(&mut w, self.head_open)?;
        w.write_all(&(self.block.len() as u64).to_le_bytes())?;
        for b in &self.block {
            w.write_all(&b.prev.to_le_bytes())?;
            w.write_all(&b.next.to_le_bytes())?;
            w.write_all(&b.num.to_le_bytes())?;
            w.write_all(&b.reject.to_le_bytes())?;
            w.write_all(&b.trial.to_le_bytes())?;
            w.write_all(&b.ehead.to_le_bytes())?;
        }
        for r in &self.reject {
            w.write_all(&r.to_le_bytes())?;
        }
        Ok(())
    }

    /// Inverse of [`Self::save_with_sidecar`]. `O(capacity)` just to copy
    /// the arrays; no search or reconstruction needed.
    pub fn load_with_sidecar<R: Read>(mut r: R) -> Result<Self, TrieIoError> {
        let mut magic = [0u8; 4];
        read_exact_or_truncated(&mut r, &mut magic)?;
        if magic != MAGIC_SIDECAR {
            return Err(TrieIoError::SidecarMismatch);
        }
        let len = read_u64(&mut r)? as usize;
        let num_keys = read_u64(&mut r)? as usize;

        let node_bytes_len = len * std::mem::size_of::<Node>();
        let mut node_bytes = vec![0u8; node_bytes_len];
        read_exact_or_truncated(&mut r, &mut node_bytes)?;
        let array: Vec<Node> = <[Node]>::ref_from_bytes(&node_bytes)
            .map_err(|_| TrieIoError::SidecarMismatch)?
            .to_vec();

        let ninfo_bytes_len = len * std::mem::size_of::<NodeInfo>();
        let mut ninfo_bytes = vec![0u8; ninfo_bytes_len];
        read_exact_or_truncated(&mut r, &mut ninfo_bytes)?;
        let ninfo: Vec<NodeInfo> = <[NodeInfo]>::ref_from_bytes(&ninfo_bytes)
            .map_err(|_| TrieIoError::SidecarMismatch)?
            .to_vec();

        let head_full = read_option(&mut r)?;
        let head_closed = read_option(&mut r)?;
        let head_open = read_option(&mut r)?;

        let num_blocks = read_u64(&mut r)? as usize;
        let mut block = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            block.push(Block {
                prev: read_i32(&mut r)?,
                next: read_i32(&mut r)?,
                num: read_i16(&mut r)?,
                reject: read_i16(&mut r)?,
                trial: read_i32(&mut r)?,
                ehead: read_i32(&mut r)?,
            });
        }

        let mut reject = [0i16; 257];
        for slot in &mut reject {
            *slot = read_i16(&mut r)?;
        }

        if array.len() != len || ninfo.len() != len || block.len() != num_blocks {
            return Err(TrieIoError::SidecarMismatch);
        }

        Ok(Self {
            array,
            ninfo,
            block,
            head_full,
            head_closed,
            head_open,
            reject,
            num_keys,
            _value: std::marker::PhantomData,
            _policy: std::marker::PhantomData,
        })
    }

    /// Rebuild `ninfo` (child/sibling chains) from `array` alone: every
    /// used cell `i` with `check == from` is a child of `from` at label
    /// `i ^ base(from)`.
    pub(crate) fn restore_ninfo(&mut self) {
        let mut has_child = vec![false; self.array.len()];
        for i in 1..self.array.len() as i32 {
            if self.array[i as usize].check < 0 {
                continue;
            }
            let from = self.array[i as usize].check;
            let base = self.array[from as usize].base();
            if base < 0 || from as usize >= self.array.len() {
                continue;
            }
            let label = (base ^ i) as u8;
            let flag = has_child[from as usize];
            self.push_sibling(from, base, label, flag);
            has_child[from as usize] = true;
        }
    }

    /// Rebuild `block` and the Full/Closed/Open lists from `array` alone.
    /// Every partially-empty block restarts as Open with a fresh trial
    /// count: the historical Closed/Open classification isn't recoverable
    /// from the raw array and there's no correctness cost to relearning it.
    pub(crate) fn restore_block(&mut self) {
        let num_blocks = self.array.len() / 256;
        self.block = Vec::with_capacity(num_blocks);
        self.head_full = None;
        self.head_closed = None;
        self.head_open = None;
        for bi in 0..num_blocks as i32 {
            let start = bi as usize * 256;
            let mut num = 0i16;
            let mut ehead = 0i32;
            let mut found = false;
            for off in 0..256usize {
                let idx = start + off;
                // Cell 0 (the root) always has check < 0 but is never a
                // true ring member; `num`/`ehead` exclude it, mirroring the
                // compensation `push_empty` applies when cell 0 is pushed.
                if idx == 0 {
                    continue;
                }
                if self.array[idx].check < 0 {
                    num += 1;
                    if !found {
                        ehead = idx as i32;
                        found = true;
                    }
                }
            }
            self.block.push(Block {
                prev: 0,
                next: 0,
                num,
                reject: 257,
                trial: 0,
                ehead,
            });
            if num == 0 {
                self.push_block(bi, ListId::Full);
            } else {
                self.push_block(bi, ListId::Open);
            }
        }
        self.reject = std::array::from_fn(|i| (i + 1) as i16);
    }
}
