//! Backing storage for the mirrored ring buffer.

#[cfg(feature = "std")]
use std::boxed::Box;

/// Mirrored physical storage, always twice the logical capacity long.
///
/// The variant records whether the engine must release the storage when it
/// is dropped; borrowed storage is never freed by the engine.
pub enum Storage<'a> {
    /// Storage allocated, zeroed and released by the engine.
    #[cfg(feature = "std")]
    Owned(Box<[u8]>),
    /// Caller-supplied storage.
    Borrowed(&'a mut [u8]),
}

impl<'a> Storage<'a> {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match *self {
            #[cfg(feature = "std")]
            Storage::Owned(ref buffer) => buffer,
            Storage::Borrowed(ref buffer) => buffer,
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match *self {
            #[cfg(feature = "std")]
            Storage::Owned(ref mut buffer) => buffer,
            Storage::Borrowed(ref mut buffer) => buffer,
        }
    }
}
