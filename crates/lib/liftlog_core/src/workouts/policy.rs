//! Validation rules for workouts and their entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::WorkoutError;
use crate::models::workout::NewWorkoutEntry;

/// Width of `workouts.title`, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Width of `workout_entries.exercise_name`, in characters.
pub const MAX_EXERCISE_NAME_LEN: usize = 255;

/// Tunable entry validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPolicy {
    /// Every entry must carry reps, a weight or a duration.
    pub require_measure: bool,
    /// Order indices must be exactly `1..=n`.
    pub require_contiguous_order: bool,
    /// Upper bound on entries per workout.
    pub max_entries: usize,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            require_measure: true,
            require_contiguous_order: false,
            max_entries: 100,
        }
    }
}

impl EntryPolicy {
    /// Validate an entry set as a whole. Nothing is written if this fails.
    pub fn validate(&self, entries: &[NewWorkoutEntry]) -> Result<(), WorkoutError> {
        if entries.len() > self.max_entries {
            return Err(WorkoutError::Validation(format!(
                "a workout cannot have more than {} entries",
                self.max_entries
            )));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            self.validate_entry(entry)?;
            if !seen.insert(entry.order_index) {
                return Err(WorkoutError::Validation(format!(
                    "duplicate order_index {}",
                    entry.order_index
                )));
            }
        }

        if self.require_contiguous_order {
            let n = entries.len() as i32;
            if !(1..=n).all(|i| seen.contains(&i)) {
                return Err(WorkoutError::Validation(
                    "order_index values must run from 1 to the number of entries".into(),
                ));
            }
        }

        Ok(())
    }

    fn validate_entry(&self, entry: &NewWorkoutEntry) -> Result<(), WorkoutError> {
        let name = entry.exercise_name.trim();
        if name.is_empty() {
            return Err(WorkoutError::Validation("exercise_name is required".into()));
        }
        if entry.exercise_name.chars().count() > MAX_EXERCISE_NAME_LEN {
            return Err(WorkoutError::Validation(format!(
                "exercise_name must not be more than {MAX_EXERCISE_NAME_LEN} characters"
            )));
        }
        if entry.sets <= 0 {
            return Err(WorkoutError::Validation(format!(
                "{name}: sets must be positive"
            )));
        }
        if entry.reps.is_some_and(|r| r < 0)
            || entry.duration_seconds.is_some_and(|d| d < 0)
            || entry.weight.is_some_and(|w| w < 0.0 || !w.is_finite())
        {
            return Err(WorkoutError::Validation(format!(
                "{name}: reps, duration_seconds and weight cannot be negative"
            )));
        }
        if self.require_measure
            && entry.reps.is_none()
            && entry.weight.is_none()
            && entry.duration_seconds.is_none()
        {
            return Err(WorkoutError::Validation(format!(
                "{name}: an entry needs reps, weight or duration_seconds"
            )));
        }
        Ok(())
    }
}

/// Validate the scalar workout fields.
pub fn validate_workout_fields(
    title: &str,
    duration_minutes: i32,
    calories_burned: i32,
) -> Result<(), WorkoutError> {
    if title.trim().is_empty() {
        return Err(WorkoutError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(WorkoutError::Validation(format!(
            "title must not be more than {MAX_TITLE_LEN} characters"
        )));
    }
    if duration_minutes < 0 {
        return Err(WorkoutError::Validation(
            "duration_minutes cannot be negative".into(),
        ));
    }
    if calories_burned < 0 {
        return Err(WorkoutError::Validation(
            "calories_burned cannot be negative".into(),
        ));
    }
    Ok(())
}
