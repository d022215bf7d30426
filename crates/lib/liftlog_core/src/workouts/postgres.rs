//! PostgreSQL workout store.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::{EntryPolicy, WorkoutError, WorkoutStore, validate_workout_fields};
use crate::models::workout::{
    NewWorkout, NewWorkoutEntry, Workout, WorkoutEntry, WorkoutRow, WorkoutUpdate,
};

/// Unique index on `(workout_id, order_index)`.
const ORDER_CONSTRAINT: &str = "workout_entries_order_unique";

/// PostgreSQL-backed workout store.
#[derive(Clone)]
pub struct PgWorkoutStore {
    pool: PgPool,
    policy: EntryPolicy,
}

impl PgWorkoutStore {
    pub fn new(pool: PgPool, policy: EntryPolicy) -> Self {
        Self { pool, policy }
    }
}

/// Translate constraint violations raised by entry inserts into validation errors.
fn entry_error(e: sqlx::Error) -> WorkoutError {
    if let sqlx::Error::Database(db) = &e {
        if db.constraint() == Some(ORDER_CONSTRAINT) {
            return WorkoutError::Validation("duplicate order_index".into());
        }
        if db.is_check_violation() {
            return WorkoutError::Validation(format!("invalid entry: {}", db.message()));
        }
    }
    WorkoutError::DbError(e)
}

/// Insert an entry set for `workout_id` on an open transaction.
async fn insert_entries(
    conn: &mut PgConnection,
    workout_id: i64,
    entries: &[NewWorkoutEntry],
) -> Result<Vec<WorkoutEntry>, WorkoutError> {
    let mut inserted = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            INSERT INTO workout_entries
                (workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            "#,
        )
        .bind(workout_id)
        .bind(&entry.exercise_name)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.duration_seconds)
        .bind(entry.weight)
        .bind(&entry.notes)
        .bind(entry.order_index)
        .fetch_one(&mut *conn)
        .await
        .map_err(entry_error)?;
        inserted.push(row);
    }
    Ok(inserted)
}

#[async_trait]
impl WorkoutStore for PgWorkoutStore {
    async fn create(&self, workout: NewWorkout) -> Result<Workout, WorkoutError> {
        validate_workout_fields(
            &workout.title,
            workout.duration_minutes,
            workout.calories_burned,
        )?;
        self.policy.validate(&workout.entries)?;

        // Dropping `tx` on any early return rolls back.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, WorkoutRow>(
            r#"
            INSERT INTO workouts (user_id, title, description, duration_minutes, calories_burned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, duration_minutes, calories_burned,
                      created_at, updated_at
            "#,
        )
        .bind(workout.user_id)
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.duration_minutes)
        .bind(workout.calories_burned)
        .fetch_one(&mut *tx)
        .await?;

        let entries = insert_entries(&mut *tx, row.id, &workout.entries).await?;

        tx.commit().await?;
        debug!(workout_id = row.id, entries = entries.len(), "workout created");
        Ok(Workout::from_rows(row, entries))
    }

    async fn get_by_id(&self, id: i64) -> Result<Workout, WorkoutError> {
        let row = sqlx::query_as::<_, WorkoutRow>(
            r#"
            SELECT id, user_id, title, description, duration_minutes, calories_burned,
                   created_at, updated_at
            FROM workouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(WorkoutError::NotFound(id))?;

        let entries = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            SELECT id, workout_id, exercise_name, sets, reps, duration_seconds, weight, notes,
                   order_index
            FROM workout_entries
            WHERE workout_id = $1
            ORDER BY order_index ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Workout::from_rows(row, entries))
    }

    async fn get_owner(&self, id: i64) -> Result<i64, WorkoutError> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM workouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(WorkoutError::NotFound(id))
    }

    async fn update(&self, update: WorkoutUpdate) -> Result<(), WorkoutError> {
        validate_workout_fields(
            &update.title,
            update.duration_minutes,
            update.calories_burned,
        )?;
        if let Some(entries) = &update.entries {
            self.policy.validate(entries)?;
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE workouts
            SET title = $1, description = $2, duration_minutes = $3, calories_burned = $4,
                updated_at = now()
            WHERE id = $5
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.duration_minutes)
        .bind(update.calories_burned)
        .bind(update.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkoutError::NotFound(update.id));
        }

        if let Some(entries) = &update.entries {
            sqlx::query("DELETE FROM workout_entries WHERE workout_id = $1")
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
            insert_entries(&mut *tx, update.id, entries).await?;
            debug!(workout_id = update.id, entries = entries.len(), "entries replaced");
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), WorkoutError> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WorkoutError::NotFound(id));
        }
        Ok(())
    }
}
