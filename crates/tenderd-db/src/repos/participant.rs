use sqlx::{PgPool, Postgres};

use tenderd_core::models::Participant;
use tenderd_core::AppError;

/// Repository for reference companies assignable to a tender's participant
/// slot.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Participant>, AppError> {
        let participant =
            sqlx::query_as::<Postgres, Participant>("SELECT * FROM participants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(participant)
    }

    pub async fn list_all(&self) -> Result<Vec<Participant>, AppError> {
        let participants =
            sqlx::query_as::<Postgres, Participant>("SELECT * FROM participants ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(participants)
    }

    /// Name of the participant assigned to a tender, used by reconciliation
    /// to match contract titles.
    pub async fn name_of(&self, id: i64) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar::<Postgres, Option<String>>(
            "SELECT name FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name.flatten())
    }
}
