use core::fmt;

/// Errors that can occur while parsing DPP wire formats or deriving keys
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Input that does not follow the format it claims to carry: the URI
    /// grammar, the SubjectPublicKeyInfo structure, the configuration-object
    /// JSON schema, or a truncated attribute TLV.
    MalformedInput,
    /// Structurally valid input asking for something this crate does not
    /// support: an unknown curve, a URI version other than 1 or 2, an
    /// operating class/channel pair outside the table, or an AKM string with
    /// no recognised suite.
    UnsupportedParameter,
    /// A cryptographic check failed: AES-SIV tag mismatch, point not on the
    /// curve, scalar out of range, or a derivation reaching the point at
    /// infinity. Terminal for the exchange that produced it.
    CryptoVerifyFailure,
    /// The system random source or the allocator failed.
    ResourceExhaustion,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedInput => write!(f, "malformed input"),
            Error::UnsupportedParameter => write!(f, "unsupported parameter"),
            Error::CryptoVerifyFailure => write!(f, "cryptographic verification failed"),
            Error::ResourceExhaustion => write!(f, "random source or allocator failure"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type
pub type Result<T> = core::result::Result<T, Error>;
