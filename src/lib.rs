//! A byte ring buffer with fixed capacity and mirrored storage.
//!
//! The physical storage is twice the logical capacity: every byte written at
//! logical position `p` is duplicated at `p + capacity`. Any contiguous
//! logical span of up to `capacity` bytes can therefore be copied with a
//! single linear memory operation, even when the span wraps around the end
//! of the logical buffer. Callers never deal with modulo arithmetic or
//! two-part copy loops.
//!
//! The buffer is aimed at byte-stream plumbing between a producer and a
//! consumer, e.g. feeding a device driver, where the storage is often a
//! static buffer handed in by the caller.
//!
//! # Feature Flags
//! The **mirrorbuf** crate has the following cargo feature flags:
//!
//! - `std`
//!   - Optional, enabled by default
//!   - Use libstd and enable [`RingBuffer::with_capacity`], the constructor
//!     that allocates and owns its storage
//!
//! # Usage
//!
//! First, add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mirrorbuf = "0.1"
//! ```
//!
//! Currently mirrorbuf by default links to the standard library, but if you
//! would instead like to use mirrorbuf in a `#![no_std]` situation or crate
//! you can request this via:
//!
//! ```toml
//! [dependencies]
//! mirrorbuf = { version = "0.1", default-features = false }
//! ```
//!
//! Without `std` the engine binds to caller-supplied storage through
//! [`RingBuffer::new`]; nothing is allocated.
//!
//! # Examples
//! ```
//! use mirrorbuf::{Error, RingBuffer};
//!
//! let mut rb = RingBuffer::with_capacity(4).unwrap();
//!
//! rb.write_slice(b"abc").unwrap();
//! assert_eq!(rb.write_capacity(), 1);
//! assert_eq!(rb.read_capacity(), 3);
//!
//! rb.write_slice(b"d").unwrap();
//! assert!(rb.is_full());
//! assert_eq!(rb.write(b'e'), Err(Error::BufferOverflow));
//!
//! let mut out = [0u8; 4];
//! rb.read_slice(&mut out).unwrap();
//! assert_eq!(&out, b"abcd");
//! ```
//!
//! # Wraparound
//!
//! A span that crosses the end of the logical buffer is still one slice on
//! the way out, because the wrapped part is mirrored past the boundary:
//!
//! ```
//! use mirrorbuf::RingBuffer;
//!
//! let mut rb = RingBuffer::with_capacity(4).unwrap();
//! rb.write_slice(b"abc").unwrap();
//! rb.skip(2).unwrap();
//! rb.write_slice(b"def").unwrap();
//!
//! // "def" wrapped around the boundary, yet the unread bytes are one
//! // contiguous slice.
//! assert_eq!(rb.as_read_slice(), b"cdef");
//! ```
//!
//! # Concurrency
//!
//! There is no internal locking. The cursors and the cycle flag are atomics
//! so that a single writer context and a single reader context can observe
//! each other's cursor without tearing; every operation loads the opposite
//! cursor first and stores its own cursor last. The atomics provide cursor
//! visibility for that one pattern only; multiple writers or multiple
//! readers need external synchronization, which this crate does not supply.
//! No operation blocks or retries; every failure returns immediately.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#![deny(missing_docs)]

extern crate crossbeam_utils;
#[cfg(not(any(feature = "std", test)))]
extern crate core as std;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crossbeam_utils::CachePadded;

mod eviction;
mod storage;
pub mod error;

pub use error::Error;
pub use eviction::Eviction;
use storage::Storage;

/// A fixed capacity byte ring buffer over mirrored storage.
///
/// The buffer owns or borrows `2 * capacity` bytes of physical storage and
/// keeps the second half a mirror of the first, so the readable region and
/// the writable region are always single contiguous slices regardless of
/// where the cursors sit.
///
/// Capacity is fixed at construction and encoded as `u16`, bounding it to
/// `65535` bytes of logical storage.
///
/// The write cursor and read cursor each stay within `[0, capacity)`; a
/// cycle flag disambiguates the equal-cursor state between logically empty
/// and logically full.
pub struct RingBuffer<'a> {
    storage: Storage<'a>,
    capacity: u16,
    wpos: CachePadded<AtomicU16>,
    rpos: CachePadded<AtomicU16>,
    cycled: AtomicBool,
}

impl<'a> RingBuffer<'a> {
    #[inline]
    fn wpos(&self) -> u16 {
        self.wpos.load(Ordering::Acquire)
    }

    #[inline]
    fn rpos(&self) -> u16 {
        self.rpos.load(Ordering::Acquire)
    }

    #[inline]
    fn is_cycled(&self) -> bool {
        self.cycled.load(Ordering::Acquire)
    }

    #[inline]
    fn set_wpos(&self, pos: u16) {
        debug_assert!(pos < self.capacity);
        self.wpos.store(pos, Ordering::Release);
    }

    #[inline]
    fn set_rpos(&self, pos: u16) {
        debug_assert!(pos < self.capacity);
        self.rpos.store(pos, Ordering::Release);
    }

    #[inline]
    fn set_cycled(&self, cycled: bool) {
        self.cycled.store(cycled, Ordering::Release);
    }

    /// Moves the write cursor forward by `count` written bytes, raising the
    /// cycle flag when the advance crosses or lands on the boundary.
    #[inline]
    fn advance_wpos(&self, count: u16) {
        let capacity = self.capacity as usize;
        let wpos = self.wpos() as usize;
        let new_wpos = (wpos + count as usize) % capacity;
        if new_wpos <= wpos {
            self.set_cycled(true);
        }
        self.set_wpos(new_wpos as u16);
    }

    /// Moves the read cursor forward by `count` consumed bytes, clearing
    /// the cycle flag when the advance crosses or lands on the boundary.
    #[inline]
    fn advance_rpos(&self, count: u16) {
        let capacity = self.capacity as usize;
        let rpos = self.rpos() as usize;
        let end = rpos + count as usize;
        if end >= capacity {
            self.set_cycled(false);
            self.set_rpos((end - capacity) as u16);
        } else {
            self.set_rpos(end as u16);
        }
    }

    /// Validates a read of `count` bytes against the capacity bound, the
    /// readable amount, and the cursor/flag consistency.
    fn check_read(&self, count: usize) -> Result<(), Error> {
        if count > self.capacity as usize {
            return Err(Error::OutOfRange);
        }
        if count > self.read_capacity() as usize {
            return Err(Error::NoData);
        }
        // An unwrapped cursor state can never require reading past the
        // logical capacity; treat the combination as corruption rather than
        // performing the copy.
        if !self.is_cycled() && self.rpos() as usize + count > self.capacity as usize {
            return Err(Error::DataInvalid);
        }
        Ok(())
    }

    /// Copies `dst.len()` unread bytes out of the mirrored storage without
    /// touching the cursors.
    fn copy_out(&self, dst: &mut [u8]) -> Result<(), Error> {
        self.check_read(dst.len())?;
        let rpos = self.rpos() as usize;
        dst.copy_from_slice(&self.storage.as_slice()[rpos..rpos + dst.len()]);
        Ok(())
    }
}

impl<'a> RingBuffer<'a> {
    /// Creates a `RingBuffer` bound to caller-supplied storage.
    ///
    /// The engine never frees `buffer`; it only requires it to stay borrowed
    /// for the buffer's lifetime. `buffer` must be exactly `2 * capacity`
    /// bytes long, the mirrored layout.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `capacity` is zero and `InvalidArgument` if
    /// `buffer` does not have the mirrored length.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut storage = [0u8; 8];
    /// let mut rb = RingBuffer::new(4, &mut storage).unwrap();
    ///
    /// rb.write_slice(b"ring").unwrap();
    /// let mut out = [0u8; 4];
    /// rb.read_slice(&mut out).unwrap();
    /// assert_eq!(&out, b"ring");
    /// ```
    ///
    /// A storage slice of the wrong length is rejected:
    ///
    /// ```
    /// use mirrorbuf::{Error, RingBuffer};
    ///
    /// assert_eq!(RingBuffer::new(4, &mut [0u8; 7]).err(), Some(Error::InvalidArgument));
    /// ```
    pub fn new(capacity: u16, buffer: &'a mut [u8]) -> Result<RingBuffer<'a>, Error> {
        if capacity == 0 {
            return Err(Error::OutOfRange);
        }
        if buffer.len() != 2 * capacity as usize {
            return Err(Error::InvalidArgument);
        }
        Ok(RingBuffer {
            storage: Storage::Borrowed(buffer),
            capacity: capacity,
            wpos: CachePadded::new(AtomicU16::new(0)),
            rpos: CachePadded::new(AtomicU16::new(0)),
            cycled: AtomicBool::new(false),
        })
    }

    /// Creates a `RingBuffer` that allocates and owns zeroed storage of
    /// `2 * capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `capacity` is zero and `AllocationFailure`
    /// if the storage cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{Error, RingBuffer};
    ///
    /// let rb = RingBuffer::with_capacity(1024).unwrap();
    /// assert_eq!(rb.capacity(), 1024);
    /// assert_eq!(rb.write_capacity(), 1024);
    ///
    /// assert_eq!(RingBuffer::with_capacity(0).err(), Some(Error::OutOfRange));
    /// ```
    #[cfg(feature = "std")]
    pub fn with_capacity(capacity: u16) -> Result<RingBuffer<'static>, Error> {
        if capacity == 0 {
            return Err(Error::OutOfRange);
        }
        let len = 2 * capacity as usize;
        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(len).is_err() {
            return Err(Error::AllocationFailure);
        }
        buffer.resize(len, 0);
        Ok(RingBuffer {
            storage: Storage::Owned(buffer.into_boxed_slice()),
            capacity: capacity,
            wpos: CachePadded::new(AtomicU16::new(0)),
            rpos: CachePadded::new(AtomicU16::new(0)),
            cycled: AtomicBool::new(false),
        })
    }

    /// Returns the logical capacity in bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let rb = RingBuffer::with_capacity(16).unwrap();
    /// assert_eq!(rb.capacity(), 16);
    /// ```
    #[inline]
    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Returns how many bytes can be written without overwriting unread
    /// data.
    ///
    /// Complementary to [`read_capacity`]: the two always sum to
    /// [`capacity`].
    ///
    /// [`read_capacity`]: #method.read_capacity
    /// [`capacity`]: #method.capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// assert_eq!(rb.write_capacity(), 8);
    ///
    /// rb.write_slice(b"abc").unwrap();
    /// assert_eq!(rb.write_capacity(), 5);
    /// ```
    pub fn write_capacity(&self) -> u16 {
        let wpos = self.wpos();
        let rpos = self.rpos();
        if !self.is_cycled() {
            if rpos > wpos {
                0
            } else {
                self.capacity - wpos + rpos
            }
        } else if rpos < wpos {
            0
        } else {
            rpos - wpos
        }
    }

    /// Returns how many unread bytes are available.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// rb.write_slice(b"abc").unwrap();
    /// assert_eq!(rb.read_capacity(), 3);
    /// ```
    pub fn read_capacity(&self) -> u16 {
        let wpos = self.wpos();
        let rpos = self.rpos();
        if !self.is_cycled() {
            if rpos > wpos {
                0
            } else {
                wpos - rpos
            }
        } else if rpos < wpos {
            0
        } else {
            self.capacity - rpos + wpos
        }
    }

    /// Returns true if no unread data is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_capacity() == 0
    }

    /// Returns true if a plain write of any length would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.write_capacity() == 0
    }

    /// Writes one byte.
    ///
    /// The byte is stored at the write cursor and duplicated in the mirror
    /// region, then the cursor advances.
    ///
    /// # Errors
    ///
    /// Returns `BufferOverflow` when the buffer is full; nothing is changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{Error, RingBuffer};
    ///
    /// let mut rb = RingBuffer::with_capacity(2).unwrap();
    /// rb.write(1).unwrap();
    /// rb.write(2).unwrap();
    /// assert_eq!(rb.write(3), Err(Error::BufferOverflow));
    /// ```
    pub fn write(&mut self, byte: u8) -> Result<(), Error> {
        if self.write_capacity() == 0 {
            return Err(Error::BufferOverflow);
        }
        let capacity = self.capacity as usize;
        let wpos = self.wpos() as usize;
        {
            let storage = self.storage.as_mut_slice();
            storage[wpos] = byte;
            storage[wpos + capacity] = byte;
        }
        self.advance_wpos(1);
        Ok(())
    }

    /// Writes a slice of bytes.
    ///
    /// An empty source is a no-op success. The bytes land at the write
    /// cursor in one pass; when the span crosses the capacity boundary the
    /// source is split there and the mirror region is back-filled so that
    /// both halves of the storage stay coherent.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `src` is longer than the logical capacity,
    /// and `BufferOverflow` if it is longer than what is currently
    /// writable. Nothing is changed on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{Error, RingBuffer};
    ///
    /// let mut rb = RingBuffer::with_capacity(10).unwrap();
    /// rb.write_slice(b"abcdefghi").unwrap();
    /// assert_eq!(rb.write_slice(b"jk"), Err(Error::BufferOverflow));
    ///
    /// let mut out = [0u8; 5];
    /// rb.read_slice(&mut out).unwrap();
    /// assert_eq!(rb.write_capacity(), 6);
    ///
    /// // wraps around the boundary
    /// rb.write_slice(b"jkl").unwrap();
    /// assert_eq!(rb.read_capacity(), 7);
    /// ```
    pub fn write_slice(&mut self, src: &[u8]) -> Result<(), Error> {
        if src.is_empty() {
            return Ok(());
        }
        let capacity = self.capacity as usize;
        if src.len() > capacity {
            return Err(Error::OutOfRange);
        }
        if src.len() > self.write_capacity() as usize {
            return Err(Error::BufferOverflow);
        }
        let wpos = self.wpos() as usize;
        let count = src.len();
        {
            let storage = self.storage.as_mut_slice();
            if wpos + count <= capacity {
                storage[wpos..wpos + count].copy_from_slice(src);
                storage[capacity + wpos..capacity + wpos + count].copy_from_slice(src);
            } else {
                // Split at the boundary: the leading part fills the primary
                // tail and its mirror, the remainder wraps to the start of
                // the primary region and back-fills the head of the mirror.
                let first = capacity - wpos;
                storage[wpos..capacity].copy_from_slice(&src[..first]);
                storage[capacity + wpos..2 * capacity].copy_from_slice(&src[..first]);
                storage[..count - first].copy_from_slice(&src[first..]);
                storage[capacity..capacity + count - first].copy_from_slice(&src[first..]);
            }
        }
        self.advance_wpos(count as u16);
        Ok(())
    }

    /// Writes a slice of bytes, discarding the oldest unread bytes if the
    /// buffer lacks space.
    ///
    /// This variant never fails with `BufferOverflow`: when `src` needs more
    /// room than is writable, the read cursor is advanced past exactly as
    /// many of the oldest unread bytes as the write requires. The discarded
    /// region is reported through an [`Eviction`] record handed to `log`
    /// synchronously, before the write proceeds.
    ///
    /// Returns the number of discarded bytes, `0` when nothing had to make
    /// way.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `src` is longer than the logical capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{Eviction, RingBuffer};
    ///
    /// let mut rb = RingBuffer::with_capacity(4).unwrap();
    /// rb.write_slice(b"abcd").unwrap();
    ///
    /// let mut lost = Vec::new();
    /// let evicted = rb
    ///     .force_write_slice(b"ef", Some(&mut |ev: Eviction| lost.extend_from_slice(ev.data)))
    ///     .unwrap();
    ///
    /// assert_eq!(evicted, 2);
    /// assert_eq!(&lost[..], b"ab");
    ///
    /// let mut out = [0u8; 4];
    /// rb.read_slice(&mut out).unwrap();
    /// assert_eq!(&out, b"cdef");
    /// ```
    pub fn force_write_slice(
        &mut self,
        src: &[u8],
        log: Option<&mut dyn FnMut(Eviction)>,
    ) -> Result<u16, Error> {
        if src.is_empty() {
            return Ok(0);
        }
        if src.len() > self.capacity as usize {
            return Err(Error::OutOfRange);
        }
        let writable = self.write_capacity() as usize;
        let mut evicted = 0;
        if src.len() > writable {
            let need = (src.len() - writable) as u16;
            let rpos = self.rpos();
            if let Some(log) = log {
                let start = rpos as usize;
                log(Eviction {
                    data: &self.storage.as_slice()[start..start + need as usize],
                    pos: rpos,
                });
            }
            self.advance_rpos(need);
            evicted = need;
        }
        self.write_slice(src)?;
        Ok(evicted)
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns `NoData` when the buffer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::{Error, RingBuffer};
    ///
    /// let mut rb = RingBuffer::with_capacity(2).unwrap();
    /// rb.write(7).unwrap();
    /// assert_eq!(rb.read(), Ok(7));
    /// assert_eq!(rb.read(), Err(Error::NoData));
    /// ```
    pub fn read(&mut self) -> Result<u8, Error> {
        let mut byte = [0];
        self.read_slice(&mut byte)?;
        Ok(byte[0])
    }

    /// Reads bytes into `dst`, consuming them.
    ///
    /// An empty destination is a no-op success. Thanks to the mirrored
    /// layout the copy is a single linear operation even when the unread
    /// span wraps around the boundary.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `dst` is longer than the logical capacity,
    /// `NoData` if it is longer than the unread amount, and `DataInvalid`
    /// if the cursor state disagrees with the requested advance. Nothing is
    /// changed on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// rb.write_slice(b"abcde").unwrap();
    ///
    /// let mut out = [0u8; 3];
    /// rb.read_slice(&mut out).unwrap();
    /// assert_eq!(&out, b"abc");
    /// assert_eq!(rb.read_capacity(), 2);
    /// ```
    pub fn read_slice(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        if dst.is_empty() {
            return Ok(());
        }
        self.copy_out(dst)?;
        self.advance_rpos(dst.len() as u16);
        Ok(())
    }

    /// Reads bytes into `dst` without consuming them.
    ///
    /// Identical contract and failure modes to [`read_slice`], but the read
    /// cursor and the cycle flag stay untouched, so repeated peeks observe
    /// the same bytes.
    ///
    /// [`read_slice`]: #method.read_slice
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// rb.write_slice(b"peek").unwrap();
    ///
    /// let mut first = [0u8; 2];
    /// rb.peek_slice(&mut first).unwrap();
    /// assert_eq!(&first, b"pe");
    /// assert_eq!(rb.read_capacity(), 4);
    /// ```
    pub fn peek_slice(&self, dst: &mut [u8]) -> Result<(), Error> {
        if dst.is_empty() {
            return Ok(());
        }
        self.copy_out(dst)
    }

    /// Moves the read cursor forward without copying, as if `count` bytes
    /// had been read and discarded.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`read_slice`].
    ///
    /// [`read_slice`]: #method.read_slice
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(16).unwrap();
    /// rb.write_slice(b"header:data").unwrap();
    /// rb.skip(7).unwrap();
    ///
    /// let mut out = [0u8; 4];
    /// rb.read_slice(&mut out).unwrap();
    /// assert_eq!(&out, b"data");
    /// ```
    pub fn skip(&mut self, count: u16) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        self.check_read(count as usize)?;
        self.advance_rpos(count);
        Ok(())
    }

    /// Returns the unread bytes as one contiguous slice.
    ///
    /// The slice starts at the read cursor and is [`read_capacity`] bytes
    /// long; the mirrored layout keeps it linear even across the wrap
    /// boundary. Consuming it is committed afterwards with [`skip`] or
    /// [`read_slice`].
    ///
    /// [`read_capacity`]: #method.read_capacity
    /// [`skip`]: #method.skip
    /// [`read_slice`]: #method.read_slice
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// rb.write_slice(b"abc").unwrap();
    /// assert_eq!(rb.as_read_slice(), b"abc");
    ///
    /// rb.skip(3).unwrap();
    /// assert!(rb.as_read_slice().is_empty());
    /// ```
    pub fn as_read_slice(&self) -> &[u8] {
        let rpos = self.rpos() as usize;
        let len = self.read_capacity() as usize;
        &self.storage.as_slice()[rpos..rpos + len]
    }

    /// Returns the free span following the write cursor as one contiguous
    /// mutable slice, [`write_capacity`] bytes long.
    ///
    /// Cursor state is not changed. A transfer staged here is committed by
    /// a subsequent [`write_slice`] of the same bytes, which performs the
    /// mirror-coherent copy and the cursor advance.
    ///
    /// [`write_capacity`]: #method.write_capacity
    /// [`write_slice`]: #method.write_slice
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorbuf::RingBuffer;
    ///
    /// let mut rb = RingBuffer::with_capacity(8).unwrap();
    /// rb.write_slice(b"abc").unwrap();
    /// assert_eq!(rb.as_write_slice().len(), 5);
    /// ```
    pub fn as_write_slice(&mut self) -> &mut [u8] {
        let wpos = self.wpos() as usize;
        let len = self.write_capacity() as usize;
        &mut self.storage.as_mut_slice()[wpos..wpos + len]
    }
}

impl<'a> fmt::Debug for RingBuffer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("wpos", &self.wpos())
            .field("rpos", &self.rpos())
            .field("cycled", &self.is_cycled())
            .finish()
    }
}
