use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// An "Any"-typed error.
pub trait WardenCustomError: StdError + Send + Sync + 'static {}

impl<E: StdError + Send + Sync + 'static> WardenCustomError for E {}

/// Thin wrapper around a boxed WardenCustomError.
#[repr(transparent)]
pub struct WardenCustomErrorWrapper(Box<dyn WardenCustomError>);

impl Debug for WardenCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn WardenCustomError>::as_ref(&self))
    }
}

impl Display for WardenCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn WardenCustomError>::as_ref(&self))
    }
}

impl StdError for WardenCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn WardenCustomError> for WardenCustomErrorWrapper {
    fn as_ref(&self) -> &dyn WardenCustomError {
        self.0.as_ref()
    }
}

impl Deref for WardenCustomErrorWrapper {
    type Target = Box<dyn WardenCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// ChainCommunicationError contains errors returned when attempting to
/// query a chain node
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// A response arrived but a required field was empty
    #[error("missing field in response: {0}")]
    MissingField(&'static str),
    /// A block height lookup returned a height that does not fit the request
    #[error("invalid block height {0}")]
    InvalidHeight(i64),
    /// Average block time was requested over an empty window
    #[error("invalid block count: cannot average over zero blocks")]
    InvalidBlockCount,
    /// Fixed-point conversion failed
    #[error(transparent)]
    Decimal(#[from] crate::DecimalError),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(WardenCustomErrorWrapper),
}

impl ChainCommunicationError {
    /// Create a chain communication error from any other existing error
    pub fn from_other<E: WardenCustomError>(err: E) -> Self {
        Self::Other(WardenCustomErrorWrapper(Box::new(err)))
    }

    /// Create a chain communication error from any other existing error
    pub fn from_other_boxed<E: WardenCustomError>(err: Box<E>) -> Self {
        Self::Other(WardenCustomErrorWrapper(err))
    }

    /// Creates a chain communication error of the other error variant from a static string
    pub fn from_other_str(err: &'static str) -> Self {
        #[derive(Debug)]
        #[repr(transparent)]
        struct StringError(&'static str);
        impl Display for StringError {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0)
            }
        }
        impl StdError for StringError {}

        Self::from_other(StringError(err))
    }
}
