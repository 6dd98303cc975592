use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use hipfrog_core::domain::installation::Installation;

pub mod installation;
pub mod memory;

pub use installation::SqlInstallationRepository;
pub use memory::InMemoryInstallationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Tenant records, one per OAuth client id.
#[async_trait]
pub trait InstallationRepository: Send + Sync {
    async fn find_by_oauth_id(&self, oauth_id: &str)
        -> Result<Option<Installation>, RepositoryError>;

    /// Inserts or fully replaces the record for `installation.oauth_id`.
    async fn save(&self, installation: Installation) -> Result<(), RepositoryError>;

    /// Returns `false` when no installation exists for `oauth_id`.
    async fn set_glassfrog_token(
        &self,
        oauth_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Persists only the access-token columns, leaving the GlassFrog token untouched.
    async fn update_access_token(&self, installation: &Installation)
        -> Result<bool, RepositoryError>;

    async fn delete(&self, oauth_id: &str) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<Installation>, RepositoryError>;
}

#[async_trait]
impl<T> InstallationRepository for std::sync::Arc<T>
where
    T: InstallationRepository + ?Sized,
{
    async fn find_by_oauth_id(
        &self,
        oauth_id: &str,
    ) -> Result<Option<Installation>, RepositoryError> {
        (**self).find_by_oauth_id(oauth_id).await
    }

    async fn save(&self, installation: Installation) -> Result<(), RepositoryError> {
        (**self).save(installation).await
    }

    async fn set_glassfrog_token(
        &self,
        oauth_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        (**self).set_glassfrog_token(oauth_id, token, updated_at).await
    }

    async fn update_access_token(
        &self,
        installation: &Installation,
    ) -> Result<bool, RepositoryError> {
        (**self).update_access_token(installation).await
    }

    async fn delete(&self, oauth_id: &str) -> Result<bool, RepositoryError> {
        (**self).delete(oauth_id).await
    }

    async fn list(&self) -> Result<Vec<Installation>, RepositoryError> {
        (**self).list().await
    }
}
