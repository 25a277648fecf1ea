//! PostgreSQL habit repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::HabitRow;
use crate::repo::{CreateHabit, HabitRepository};

/// PostgreSQL habit repository
#[derive(Clone)]
pub struct PgHabitRepository {
    pool: PgPool,
}

impl PgHabitRepository {
    /// Create a new habit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HabitRepository for PgHabitRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<HabitRow>> {
        let habit = sqlx::query_as::<_, HabitRow>(
            "SELECT id, user_id, name, archived, created_at FROM habits WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(habit)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<HabitRow>> {
        let habits = sqlx::query_as::<_, HabitRow>(
            r#"
            SELECT id, user_id, name, archived, created_at
            FROM habits
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(habits)
    }

    async fn count_active_by_user(&self, user_id: Uuid) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM habits WHERE user_id = $1 AND archived = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn create(&self, habit: CreateHabit) -> DbResult<HabitRow> {
        let row = sqlx::query_as::<_, HabitRow>(
            r#"
            INSERT INTO habits (id, user_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, archived, created_at
            "#,
        )
        .bind(habit.id)
        .bind(habit.user_id)
        .bind(&habit.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn archive(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE habits SET archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
