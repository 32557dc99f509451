use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::models::CatalogOperation;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CoreErrorKind {
    InvalidInput,
    ParseFailure,
    Timeout,
    UpstreamFailure,
    Unauthorized,
    StorageFailure,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreError {
    pub operation: Option<CatalogOperation>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_operation(mut self, operation: CatalogOperation) -> Self {
        self.operation.get_or_insert(operation);
        self
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.operation {
            Some(operation) => write!(f, "{:?} ({:?}): {}", self.kind, operation, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for CoreError {}

/// Failure details retained on a cache entry after a fetch fails.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: CoreErrorKind,
    pub message: String,
}

impl From<&CoreError> for ErrorInfo {
    fn from(error: &CoreError) -> Self {
        Self {
            kind: error.kind,
            message: error.message.clone(),
        }
    }
}

impl From<ErrorInfo> for CoreError {
    fn from(info: ErrorInfo) -> Self {
        CoreError::new(info.kind, info.message)
    }
}
