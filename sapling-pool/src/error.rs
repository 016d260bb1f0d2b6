/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::error::Error;
use std::fmt;
use std::io;
use std::num;

#[derive(Debug)]
pub struct IronfishError {
    pub kind: IronfishErrorKind,
    pub source: Option<Box<dyn Error + Send + Sync>>,
    pub backtrace: Backtrace,
}

/// Error type used across the crate. Keeps a single type for anything that
/// can go wrong inside the cryptographic core, whether raised directly or
/// wrapping an error from a dependency.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IronfishErrorKind {
    /// Group decompression or hash-to-curve produced a point off-curve or
    /// outside the prime-order subgroup.
    InvalidPoint,
    /// Field inversion of zero.
    DivisionByZero,
    /// AEAD authentication tag did not verify.
    AuthTagInvalid,
    /// A recomputed note commitment did not match the on-chain one.
    CommitmentMismatch,
    /// Decrypted note plaintext did not parse into a well-formed note.
    MalformedPlaintext,
    /// Bech32-style checksum did not verify.
    InvalidChecksum,
    /// A fixed-size field was the wrong length at a boundary.
    InvalidLength,
    /// The selector could not reach the requested target value.
    InsufficientFunds,
    /// The external prover oracle failed.
    ProverError,
    /// The key/value persistence backend failed.
    PersistenceError,
    /// The scanner returned early due to a cooperative cancellation request.
    Aborted,
    /// A key, scalar, or seed decoded to an invalid or degenerate value
    /// (zero spend-authorizing key, non-reduced scalar where one is
    /// required, etc).
    InvalidSecret,
    /// A signature did not verify.
    InvalidSignature,
    /// A serialized field element was not canonically reduced or out of
    /// range for the field.
    InvalidFr,
    /// A point produced during deserialization was not of the expected
    /// order (failed the cofactor/subgroup check).
    IsSmallOrder,
    /// Generic malformed input that does not fit a more specific kind.
    InvalidData,
    /// A viewing key, address, or spending key failed to parse.
    InvalidViewingKey,
    /// Underlying I/O error.
    Io,
    /// `std::num::TryFromIntError` conversion failure.
    TryFromInt,
    /// A Merkle witness did not recompute to the expected anchor.
    InconsistentWitness,
}

impl IronfishError {
    pub fn new(kind: IronfishErrorKind) -> Self {
        Self {
            kind,
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    pub fn new_with_source<E>(kind: IronfishErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind,
            source: Some(source.into()),
            backtrace: Backtrace::capture(),
        }
    }
}

impl Error for IronfishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl fmt::Display for IronfishError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let has_backtrace = self.backtrace.status() == BacktraceStatus::Captured;
        write!(f, "{:?}", self.kind)?;
        if let Some(source) = &self.source {
            write!(f, "\nCaused by: \n{}", source)?;
        }
        if has_backtrace {
            write!(f, "\nBacktrace:\n{:2}", self.backtrace)
        } else {
            write!(f, "\nTo enable Rust backtraces, use RUST_BACKTRACE=1")
        }
    }
}

impl From<IronfishErrorKind> for IronfishError {
    fn from(kind: IronfishErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<io::Error> for IronfishError {
    fn from(e: io::Error) -> IronfishError {
        IronfishError::new_with_source(IronfishErrorKind::Io, e)
    }
}

impl From<num::TryFromIntError> for IronfishError {
    fn from(e: num::TryFromIntError) -> IronfishError {
        IronfishError::new_with_source(IronfishErrorKind::TryFromInt, e)
    }
}
