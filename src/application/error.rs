use thiserror::Error;

use crate::{
    application::repos::CatalogError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Failure of a digest operation. Cache failures never surface here.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Whether the failure came from the catalog collaborator.
    pub fn is_catalog_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::Digest(DigestError::Catalog(CatalogError::Unavailable(_)))
        )
    }
}
