use std::borrow::Cow;

/// Error that occurs while decoding addresses, unlock scripts or compact integers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The address text is not valid base58.
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    /// The decoded address bytes do not form a known address kind.
    #[error("invalid address: {0}")]
    InvalidAddress(Cow<'static, str>),

    /// The unlock script is not a well formed multi-public-key script.
    #[error("malformed unlock script: {0}")]
    MalformedScript(Cow<'static, str>),

    /// A compact integer is truncated or too large.
    #[error("invalid compact integer: {0}")]
    CompactInt(Cow<'static, str>),
}

impl CodecError {
    pub(crate) fn malformed_script<E>(reason: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::MalformedScript(reason.into())
    }

    pub(crate) fn invalid_address<E>(reason: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidAddress(reason.into())
    }
}
