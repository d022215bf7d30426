//! Workout aggregate models.
//!
//! A workout and its entries form one consistency unit: entries are only
//! ever written together with their parent and are replaced wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database row for `workouts`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkoutRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for `workout_entries`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkoutEntry {
    pub id: i64,
    #[serde(skip)]
    pub workout_id: i64,
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub weight: Option<f64>,
    pub notes: String,
    pub order_index: i32,
}

/// A workout with its entries, sorted by `order_index`.
#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub entries: Vec<WorkoutEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// Assemble the aggregate from its rows.
    pub fn from_rows(row: WorkoutRow, mut entries: Vec<WorkoutEntry>) -> Self {
        entries.sort_by_key(|e| e.order_index);
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            duration_minutes: row.duration_minutes,
            calories_burned: row.calories_burned,
            entries,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Entry as supplied by a caller, before it has an ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutEntry {
    pub exercise_name: String,
    pub sets: i32,
    #[serde(default)]
    pub reps: Option<i32>,
    #[serde(default)]
    pub duration_seconds: Option<i32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub order_index: i32,
}

impl From<&WorkoutEntry> for NewWorkoutEntry {
    fn from(e: &WorkoutEntry) -> Self {
        Self {
            exercise_name: e.exercise_name.clone(),
            sets: e.sets,
            reps: e.reps,
            duration_seconds: e.duration_seconds,
            weight: e.weight,
            notes: e.notes.clone(),
            order_index: e.order_index,
        }
    }
}

/// Input for `WorkoutStore::create`. The owner is taken from the caller's
/// identity, never from the request body.
#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub entries: Vec<NewWorkoutEntry>,
}

/// Input for `WorkoutStore::update`: the full set of mutable fields.
///
/// `entries: None` leaves the stored entries untouched; `Some` replaces them.
#[derive(Debug, Clone)]
pub struct WorkoutUpdate {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub entries: Option<Vec<NewWorkoutEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, order_index: i32) -> WorkoutEntry {
        WorkoutEntry {
            id,
            workout_id: 1,
            exercise_name: format!("exercise-{id}"),
            sets: 3,
            reps: Some(10),
            duration_seconds: None,
            weight: None,
            notes: String::new(),
            order_index,
        }
    }

    #[test]
    fn from_rows_sorts_entries_by_order_index() {
        let now = Utc::now();
        let row = WorkoutRow {
            id: 1,
            user_id: 2,
            title: "push day".into(),
            description: String::new(),
            duration_minutes: 60,
            calories_burned: 200,
            created_at: now,
            updated_at: now,
        };
        let workout = Workout::from_rows(row, vec![entry(10, 3), entry(11, 1), entry(12, 2)]);
        let order: Vec<i32> = workout.entries.iter().map(|e| e.order_index).collect();
        assert_eq!(vec![1, 2, 3], order);
    }

    #[test]
    fn entry_serialization_omits_parent_id() {
        let json = serde_json::to_value(entry(5, 1)).unwrap();
        assert!(json.get("workout_id").is_none());
        assert_eq!(json["order_index"], 1);
    }
}
