use warden_core::ChainCommunicationError;

/// Errors from the crates used by this crate
#[derive(Debug, thiserror::Error)]
pub enum WardenCosmosError {
    /// gRPC error
    #[error("{0}")]
    GrpcError(#[from] tonic::Status),
    /// gRPC transport error
    #[error("{0}")]
    TransportError(#[from] tonic::transport::Error),
    /// protobuf decoding error
    #[error("{0}")]
    Decode(#[from] prost::DecodeError),
    /// Bech32 or public key error
    #[error("{0}")]
    AddressError(String),
    /// Public key error
    #[error("{0}")]
    PublicKeyError(String),
    /// Parsing error
    #[error("{0}")]
    ParsingFailed(String),
}

impl From<WardenCosmosError> for ChainCommunicationError {
    fn from(value: WardenCosmosError) -> Self {
        ChainCommunicationError::from_other(value)
    }
}
