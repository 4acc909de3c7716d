
//! Error type definitions.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::io;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;

/// A result that may contain an error of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if successful, does not contain any value.
pub type UnitResult = Result<()>;


/// An error that may happen while decoding or encoding a raw pixel layout.
/// Distinguishes between malformed input, unimplemented configurations,
/// and logic errors inside this crate.
#[derive(Debug)]
pub enum Error {

    /// The layout description or the payload bytes contradict themselves
    /// or the format. Decoding a truncated payload also produces this error.
    Invalid(Cow<'static, str>),

    /// The description is syntactically valid, but describes a combination
    /// this crate (or the enabled feature set) does not implement.
    NotSupported(Cow<'static, str>),

    /// A logic error inside this crate. This is always a bug, and never
    /// reachable from untrusted input when validation is correct.
    Bug(Cow<'static, str>),

    /// The byte source failed to deliver the requested range.
    Io(IoError),
}

impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }

    /// Create an error of the variant `Bug`.
    pub(crate) fn bug(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Bug(message.into())
    }
}

/// Enable using the `?` operator on `io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Error::invalid("reference to missing bytes")
        }
        else {
            Error::Io(error)
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Bug(message) => write!(formatter, "internal error: {}", message),
            Error::Io(error) => write!(formatter, "io error: {}", error),
        }
    }
}


/// Panic-free conversion, returns `Error::Invalid` on overflow.
pub(crate) fn u64_to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid("byte count too large for this machine"))
}
