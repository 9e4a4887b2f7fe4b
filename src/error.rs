//! Error values for ring buffer operations.

#[cfg(feature = "std")]
use std::error::Error as StdError;
use std::fmt;

/// Error value returned by every fallible ring buffer operation.
///
/// Operations are all-or-nothing: whenever one of these is returned, the
/// cursors, the cycle flag and the storage contents are left untouched.
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum Error {
    /// A supplied storage reference is unusable, e.g. a borrowed buffer
    /// whose length is not twice the logical capacity.
    InvalidArgument,
    /// A requested capacity or transfer count lies outside the logical
    /// capacity range.
    OutOfRange,
    /// Backing storage could not be allocated.
    AllocationFailure,
    /// A plain write would overwrite unread data.
    BufferOverflow,
    /// A read, peek or skip asked for more data than is available.
    NoData,
    /// The cursor/flag state is inconsistent with the requested operation.
    DataInvalid,
}

impl Error {
    fn as_str(&self) -> &'static str {
        match *self {
            Error::InvalidArgument => "unusable storage reference",
            Error::OutOfRange => "count exceeds logical capacity",
            Error::AllocationFailure => "storage allocation failed",
            Error::BufferOverflow => "write would overrun unread data",
            Error::NoData => "not enough readable data",
            Error::DataInvalid => "cursor state is inconsistent",
        }
    }
}

#[cfg(feature = "std")]
impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
