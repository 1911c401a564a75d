//! Structured error kinds for the core compiler and loader.

use thiserror::Error;

/// Errors produced by [`crate::compiler`] or [`crate::loader`].
///
/// Every core operation either succeeds fully or fails with one of these
/// kinds; there is no partial success and no internal recovery.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("entry at {path} is neither a directory map nor a byte sequence")]
    InvalidEntry { path: String },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: InvalidNameReason },

    #[error("blob would exceed the 32-bit pointer range (needed {needed} bytes, max {max})")]
    BlobTooLarge { needed: u64, max: u64 },

    #[error("zlib compression failed for {path}: {source}")]
    CompressionFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zlib decompression failed at offset {at}: {source}")]
    DecompressionFailed {
        at: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("read of {needed} byte(s) at offset {at} would run past the end of the blob ({blob_len} bytes)")]
    TruncatedBlob {
        at: u32,
        needed: usize,
        blob_len: usize,
    },

    #[error("name at offset {at} is not valid UTF-8")]
    InvalidUtf8 { at: u32 },

    #[error("entry at offset {at} sets reserved flag bits: {flags:#010b}")]
    UnknownFlags { at: u32, flags: u8 },

    #[error("directory nesting at offset {at} exceeds the configured limit of {limit}")]
    DepthExceeded { at: u32, limit: usize },
}

/// Why a name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidNameReason {
    ContainsNul,
    NotUtf8,
}

impl std::fmt::Display for InvalidNameReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContainsNul => write!(f, "contains a 0x00 byte"),
            Self::NotUtf8 => write!(f, "is not valid UTF-8"),
        }
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, BlobError>;

/// Collaborator-side errors: filesystem scanning and CLI I/O.
///
/// Kept separate from [`BlobError`] because these never arise from blob
/// bytes themselves, only from the surrounding environment.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("unsupported file type at {path}: {kind}")]
    UnsupportedFileType { path: String, kind: String },

    #[error("invalid output format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
