use shared::{
    domain::{Grant, ItemId, ResourceType},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend rejected request: {0}")]
    Api(#[from] ApiError),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("missing '{grant}' grant on {resource}")]
    PermissionDenied { resource: ResourceType, grant: Grant },
    #[error("index {index} out of range for collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("item {0} is not part of this collection")]
    UnknownItem(ItemId),
    #[error("operation not supported on collection {0}")]
    UnsupportedCollection(String),
}

impl ClientError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api(error) => Some(error.code),
            ClientError::NotAuthenticated => Some(ErrorCode::Unauthorized),
            ClientError::PermissionDenied { .. } => Some(ErrorCode::Forbidden),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
