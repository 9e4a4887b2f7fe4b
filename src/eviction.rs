//! Eviction reporting for forced writes.

/// Record describing unread bytes discarded by a forced write.
///
/// When a forced write needs more room than is currently writable, the
/// oldest unread bytes are discarded to make space. The discarded region is
/// handed to the caller's eviction callback through this record,
/// synchronously, before the write that displaces it proceeds.
///
/// `data` borrows the mirrored storage and is only valid for the duration
/// of the callback; the region it refers to is overwritten as soon as the
/// forced write continues.
#[derive(Clone, Copy, Debug)]
pub struct Eviction<'a> {
    /// The discarded bytes, oldest first.
    pub data: &'a [u8],
    /// Read cursor position at which the discarded region began.
    pub pos: u16,
}

impl<'a> Eviction<'a> {
    /// Number of discarded bytes.
    #[inline]
    pub fn len(&self) -> u16 {
        self.data.len() as u16
    }

    /// Returns true if nothing was discarded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
