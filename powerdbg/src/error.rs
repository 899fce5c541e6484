use thiserror::Error;

use crate::target::TargetId;

/// The topology model itself is inconsistent.
///
/// None of these conditions can be caused by the hardware: they mean the
/// expanded topology description disagrees with what the caller asked for,
/// and continuing would operate on a model that does not match the machine.
/// They are surfaced as a distinct error class so callers can tell them apart
/// from transfer failures, but there is no point retrying one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Walked off the top of the tree without finding an ancestor of the
    /// requested class.
    #[error("no ancestor of class {class:?} above target {start:?}")]
    NoAncestorOfClass {
        /// Target the translation started from.
        start: TargetId,
        /// Class that was requested.
        class: String,
    },
    /// A class was required that no target in the tree belongs to.
    #[error("no target class named {0:?} exists")]
    MissingClass(String),
    /// The root target has no parent.
    #[error("target {0:?} has no parent")]
    NoParent(TargetId),
    /// A target resolved as the owner of a bus access carries no backend for
    /// that bus kind.
    #[error("target {target:?} carries no {bus} bus interface")]
    NoBusInterface {
        /// Target the access resolved to.
        target: TargetId,
        /// Bus class that was dispatched.
        bus: &'static str,
    },
    /// Address translation produced an address wider than the bus supports.
    #[error("translated address {address:#x} does not fit the 32-bit {bus} bus")]
    AddressOutOfRange {
        /// The translated 64-bit address.
        address: u64,
        /// Bus class that was dispatched.
        bus: &'static str,
    },
}

/// The indirect access window completed the transfer with error status {status}.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct IndirectTransferError {
    /// Value of the error field of the status word.
    pub status: u8,
}

/// An error during a bus access.
#[derive(Debug, Error)]
pub enum Error {
    /// The hardware topology model is inconsistent; see [`ModelError`].
    #[error("the hardware topology model is inconsistent")]
    Model(#[from] ModelError),
    /// The address selects the form 1 indirect encoding, which this library
    /// does not implement.
    #[error("indirect form 1 addresses are not supported")]
    UnsupportedIndirectForm,
    /// The indirect window reported completion with its error field set.
    #[error(transparent)]
    IndirectTransfer(#[from] IndirectTransferError),
    /// The indirect window never reported completion within the retry budget.
    #[error("indirect access did not complete after {retries} status polls")]
    IndirectRetriesExhausted {
        /// Number of status polls that were issued.
        retries: usize,
    },
    /// The transport backend reported a failure.
    #[error("the bus backend reported a transfer failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Any other error, reported by a backend that has no typed failure of
    /// its own.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap a backend transport failure.
    pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(e))
    }

    /// Returns the model inconsistency behind this error, if that is what it
    /// is.
    pub fn as_model_error(&self) -> Option<&ModelError> {
        match self {
            Error::Model(e) => Some(e),
            _ => None,
        }
    }
}
