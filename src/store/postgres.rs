use async_trait::async_trait;
use sqlx::PgPool;

use super::{Credential, CredentialUpsert, LinkState, NewLinkState, Store};

const CREDENTIAL_COLUMNS: &str =
    "user_id, team_id, team_name, access_token, scope, authed_user_id, status, installed_at, updated_at";

const UPSERT_CREDENTIAL_SQL: &str = r#"INSERT INTO workspace_credentials
       (user_id, team_id, team_name, access_token, scope, authed_user_id, status)
   VALUES ($1, $2, $3, $4, $5, $6, 'active')
   ON CONFLICT (user_id, team_id) DO UPDATE SET
       team_name = EXCLUDED.team_name,
       access_token = EXCLUDED.access_token,
       scope = EXCLUDED.scope,
       authed_user_id = EXCLUDED.authed_user_id,
       status = 'active',
       updated_at = NOW()
   RETURNING user_id, team_id, team_name, access_token, scope, authed_user_id, status, installed_at, updated_at"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_link_state(&self, state: &NewLinkState) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO oauth_link_states (provider, state, user_id, used, expires_at)
             VALUES ($1, $2, $3, FALSE, $4)",
        )
        .bind(&state.provider)
        .bind(&state.state)
        .bind(state.user_id)
        .bind(state.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn link_state(&self, token: &str) -> anyhow::Result<Option<LinkState>> {
        let row = sqlx::query_as::<_, LinkState>(
            "SELECT state, provider, user_id, used, created_at, expires_at
             FROM oauth_link_states WHERE state = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_link_state_used(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE oauth_link_states SET used = TRUE WHERE state = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_credential(&self, upsert: &CredentialUpsert) -> anyhow::Result<Credential> {
        let row = sqlx::query_as::<_, Credential>(UPSERT_CREDENTIAL_SQL)
            .bind(upsert.user_id)
            .bind(&upsert.team_id)
            .bind(&upsert.team_name)
            .bind(&upsert.access_token)
            .bind(&upsert.scope)
            .bind(&upsert.authed_user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn finalize_link(
        &self,
        state_token: &str,
        upsert: &CredentialUpsert,
    ) -> anyhow::Result<Credential> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE oauth_link_states SET used = TRUE WHERE state = $1")
            .bind(state_token)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, Credential>(UPSERT_CREDENTIAL_SQL)
            .bind(upsert.user_id)
            .bind(&upsert.team_id)
            .bind(&upsert.team_name)
            .bind(&upsert.access_token)
            .bind(&upsert.scope)
            .bind(&upsert.authed_user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn active_credential(&self, user_id: i64) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, Credential>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM workspace_credentials
             WHERE user_id = $1 AND status = 'active'
             ORDER BY installed_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
