use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use hipfrog_core::domain::installation::Installation;

use super::{InstallationRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryInstallationRepository {
    installations: RwLock<HashMap<String, Installation>>,
}

#[async_trait::async_trait]
impl InstallationRepository for InMemoryInstallationRepository {
    async fn find_by_oauth_id(
        &self,
        oauth_id: &str,
    ) -> Result<Option<Installation>, RepositoryError> {
        let installations = self.installations.read().await;
        Ok(installations.get(oauth_id).cloned())
    }

    async fn save(&self, installation: Installation) -> Result<(), RepositoryError> {
        let mut installations = self.installations.write().await;
        let created_at = installations
            .get(&installation.oauth_id)
            .map(|existing| existing.created_at)
            .unwrap_or(installation.created_at);
        let oauth_id = installation.oauth_id.clone();
        installations.insert(oauth_id, Installation { created_at, ..installation });
        Ok(())
    }

    async fn set_glassfrog_token(
        &self,
        oauth_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut installations = self.installations.write().await;
        let Some(installation) = installations.get_mut(oauth_id) else {
            return Ok(false);
        };
        installation.glassfrog_token = Some(token.to_string().into());
        installation.updated_at = updated_at;
        Ok(true)
    }

    async fn update_access_token(
        &self,
        installation: &Installation,
    ) -> Result<bool, RepositoryError> {
        let mut installations = self.installations.write().await;
        let Some(stored) = installations.get_mut(&installation.oauth_id) else {
            return Ok(false);
        };
        stored.access_token = installation.access_token.clone();
        stored.token_type = installation.token_type.clone();
        stored.scope = installation.scope.clone();
        stored.group_id = installation.group_id;
        stored.group_name = installation.group_name.clone();
        stored.token_expires_at = installation.token_expires_at;
        stored.updated_at = installation.updated_at;
        Ok(true)
    }

    async fn delete(&self, oauth_id: &str) -> Result<bool, RepositoryError> {
        let mut installations = self.installations.write().await;
        Ok(installations.remove(oauth_id).is_some())
    }

    async fn list(&self) -> Result<Vec<Installation>, RepositoryError> {
        let installations = self.installations.read().await;
        let mut all: Vec<Installation> = installations.values().cloned().collect();
        all.sort_by(|left, right| {
            left.created_at.cmp(&right.created_at).then_with(|| left.oauth_id.cmp(&right.oauth_id))
        });
        Ok(all)
    }
}
