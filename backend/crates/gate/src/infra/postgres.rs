//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{MarkUsedOutcome, TokenRecord};
use crate::domain::repository::TokenUsageRepository;
use crate::domain::value_objects::EthAddress;
use crate::error::GateResult;

/// PostgreSQL-backed token usage repository
#[derive(Clone)]
pub struct PgTokenUsageRepository {
    pool: PgPool,
}

impl PgTokenUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TokenUsageRow {
    token_id: i64,
    used: bool,
    used_by: Option<String>,
    used_at: Option<DateTime<Utc>>,
}

impl TokenUsageRow {
    fn into_record(self) -> TokenRecord {
        TokenRecord {
            token_id: self.token_id,
            used: self.used,
            used_by: self.used_by,
            used_at: self.used_at,
        }
    }
}

impl TokenUsageRepository for PgTokenUsageRepository {
    async fn get_usage(&self, token_id: u64) -> GateResult<Option<TokenRecord>> {
        let row = sqlx::query_as::<_, TokenUsageRow>(
            r#"
            SELECT
                token_id,
                used,
                used_by,
                used_at
            FROM token_usage
            WHERE token_id = $1
            "#,
        )
        .bind(token_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn mark_used(
        &self,
        token_id: u64,
        used_by: &EthAddress,
        used_at: DateTime<Utc>,
    ) -> GateResult<MarkUsedOutcome> {
        // Conditional on used = FALSE: of any number of concurrent
        // callers, exactly one sees a returned row.
        let row = sqlx::query_as::<_, TokenUsageRow>(
            r#"
            UPDATE token_usage
            SET used = TRUE,
                used_by = $2,
                used_at = $3
            WHERE token_id = $1 AND used = FALSE
            RETURNING
                token_id,
                used,
                used_by,
                used_at
            "#,
        )
        .bind(token_id as i64)
        .bind(used_by.as_str())
        .bind(used_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            tracing::info!(token_id, used_by = %used_by, "token marked used");
            return Ok(MarkUsedOutcome::Marked(row.into_record()));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM token_usage WHERE token_id = $1)",
        )
        .bind(token_id as i64)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(MarkUsedOutcome::AlreadyUsed)
        } else {
            Ok(MarkUsedOutcome::NotFound)
        }
    }
}
