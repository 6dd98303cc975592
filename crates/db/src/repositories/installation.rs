use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{sqlite::SqliteRow, Row};

use hipfrog_core::domain::installation::Installation;

use super::{InstallationRepository, RepositoryError};
use crate::DbPool;

const SELECT_COLUMNS: &str = "SELECT
        oauth_id,
        oauth_secret,
        capabilities_url,
        room_id,
        group_id,
        token_url,
        api_url,
        access_token,
        token_type,
        scope,
        group_name,
        token_expires_at,
        glassfrog_token,
        created_at,
        updated_at
     FROM installation";

pub struct SqlInstallationRepository {
    pool: DbPool,
}

impl SqlInstallationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InstallationRepository for SqlInstallationRepository {
    async fn find_by_oauth_id(
        &self,
        oauth_id: &str,
    ) -> Result<Option<Installation>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE oauth_id = ?"))
            .bind(oauth_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(installation_from_row).transpose()
    }

    async fn save(&self, installation: Installation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO installation (
                oauth_id,
                oauth_secret,
                capabilities_url,
                room_id,
                group_id,
                token_url,
                api_url,
                access_token,
                token_type,
                scope,
                group_name,
                token_expires_at,
                glassfrog_token,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(oauth_id) DO UPDATE SET
                oauth_secret = excluded.oauth_secret,
                capabilities_url = excluded.capabilities_url,
                room_id = excluded.room_id,
                group_id = excluded.group_id,
                token_url = excluded.token_url,
                api_url = excluded.api_url,
                access_token = excluded.access_token,
                token_type = excluded.token_type,
                scope = excluded.scope,
                group_name = excluded.group_name,
                token_expires_at = excluded.token_expires_at,
                glassfrog_token = excluded.glassfrog_token,
                updated_at = excluded.updated_at",
        )
        .bind(&installation.oauth_id)
        .bind(installation.oauth_secret.expose_secret())
        .bind(&installation.capabilities_url)
        .bind(installation.room_id)
        .bind(installation.group_id)
        .bind(&installation.token_url)
        .bind(&installation.api_url)
        .bind(installation.access_token.expose_secret())
        .bind(&installation.token_type)
        .bind(&installation.scope)
        .bind(installation.group_name.as_deref())
        .bind(installation.token_expires_at.to_rfc3339())
        .bind(installation.glassfrog_token.as_ref().map(|token| token.expose_secret()))
        .bind(installation.created_at.to_rfc3339())
        .bind(installation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_glassfrog_token(
        &self,
        oauth_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE installation SET glassfrog_token = ?, updated_at = ? WHERE oauth_id = ?",
        )
        .bind(token)
        .bind(updated_at.to_rfc3339())
        .bind(oauth_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_access_token(
        &self,
        installation: &Installation,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE installation SET
                access_token = ?,
                token_type = ?,
                scope = ?,
                group_id = ?,
                group_name = ?,
                token_expires_at = ?,
                updated_at = ?
             WHERE oauth_id = ?",
        )
        .bind(installation.access_token.expose_secret())
        .bind(&installation.token_type)
        .bind(&installation.scope)
        .bind(installation.group_id)
        .bind(installation.group_name.as_deref())
        .bind(installation.token_expires_at.to_rfc3339())
        .bind(installation.updated_at.to_rfc3339())
        .bind(&installation.oauth_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, oauth_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM installation WHERE oauth_id = ?")
            .bind(oauth_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Installation>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY created_at ASC, oauth_id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(installation_from_row).collect()
    }
}

fn installation_from_row(row: SqliteRow) -> Result<Installation, RepositoryError> {
    Ok(Installation {
        oauth_id: row.try_get("oauth_id")?,
        oauth_secret: SecretString::from(row.try_get::<String, _>("oauth_secret")?),
        capabilities_url: row.try_get("capabilities_url")?,
        room_id: row.try_get("room_id")?,
        group_id: row.try_get("group_id")?,
        token_url: row.try_get("token_url")?,
        api_url: row.try_get("api_url")?,
        access_token: SecretString::from(row.try_get::<String, _>("access_token")?),
        token_type: row.try_get("token_type")?,
        scope: row.try_get("scope")?,
        group_name: row.try_get("group_name")?,
        token_expires_at: parse_timestamp("token_expires_at", row.try_get("token_expires_at")?)?,
        glassfrog_token: row.try_get::<Option<String>, _>("glassfrog_token")?.map(SecretString::from),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
