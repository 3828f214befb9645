//! Relocation notifications: every time `resolve` moves a cell from one
//! slot to another, the active sink is told so callers can keep external
//! indexes (leaf handles, cursors) in sync.

/// Receives `(old_slot, new_slot)` whenever insertion relocates a cell.
///
/// Implement this if you hold onto `LeafId`s or raw cell indices across
/// calls to `update`/`insert` and need them to track relocation.
pub trait RelocationSink {
    fn on_move(&mut self, old_slot: i32, new_slot: i32);
}

/// The default sink: relocation is invisible to callers who only use
/// `LeafId`s returned from the same call that produced them.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl RelocationSink for NoopSink {
    #[inline]
    fn on_move(&mut self, _old_slot: i32, _new_slot: i32) {}
}
