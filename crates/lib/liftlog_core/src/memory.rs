//! In-memory store implementations.
//!
//! Deterministic stand-ins for the PostgreSQL stores, used by the test
//! suites and for running the API without a database. Each store keeps its
//! state behind one mutex; every operation validates before it mutates, so
//! a failed write leaves nothing behind, the same as a rolled-back
//! transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::auth::AuthError;
use crate::auth::password::PasswordCodec;
use crate::auth::tokens::{TokenStore, fingerprint, new_token};
use crate::auth::users::{UserStore, validate_new_user};
use crate::models::auth::{IssuedToken, NewUser, TokenRecord, TokenScope, User};
use crate::models::workout::{NewWorkout, NewWorkoutEntry, Workout, WorkoutEntry, WorkoutUpdate};
use crate::workouts::{EntryPolicy, WorkoutError, WorkoutStore, validate_workout_fields};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Token store keyed by fingerprint.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (possibly expired) tokens.
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether any stored record holds this exact string as its fingerprint.
    pub async fn contains_fingerprint(&self, value: &str) -> bool {
        self.tokens.lock().await.contains_key(value)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn issue(
        &self,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<IssuedToken, AuthError> {
        let (token, hash) = new_token(user_id, ttl, scope);
        let record = TokenRecord {
            fingerprint: hash.clone(),
            user_id,
            expiry: token.expiry,
            scope: scope.as_str().to_string(),
        };
        self.tokens.lock().await.insert(hash, record);
        Ok(token)
    }

    async fn resolve(&self, scope: TokenScope, plaintext: &str) -> Result<i64, AuthError> {
        let hash = fingerprint(plaintext);
        let now = Utc::now();
        self.tokens
            .lock()
            .await
            .get(&hash)
            .filter(|r| r.scope == scope.as_str() && r.expiry > now)
            .map(|r| r.user_id)
            .ok_or_else(|| AuthError::NotFound("token".into()))
    }

    async fn revoke_all(&self, user_id: i64, scope: TokenScope) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .await
            .retain(|_, r| !(r.user_id == user_id && r.scope == scope.as_str()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

/// User store with the same uniqueness rules as the `users` table.
pub struct MemoryUserStore {
    codec: PasswordCodec,
    tokens: Arc<dyn TokenStore>,
    table: Mutex<UserTable>,
}

impl MemoryUserStore {
    pub fn new(codec: PasswordCodec, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            codec,
            tokens,
            table: Mutex::new(UserTable::default()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser, password: &str) -> Result<User, AuthError> {
        validate_new_user(&new_user, password)?;
        let hash = self.codec.hash_blocking(password).await?;

        let mut table = self.table.lock().await;
        if table.rows.values().any(|u| u.username == new_user.username) {
            return Err(AuthError::Conflict("username already taken".into()));
        }
        if table.rows.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::Conflict("email already registered".into()));
        }

        table.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: table.next_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: hash,
            bio: new_user.bio.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, AuthError> {
        self.table
            .lock()
            .await
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| AuthError::NotFound(format!("user '{username}'")))
    }

    async fn find_by_id(&self, id: i64) -> Result<User, AuthError> {
        self.table
            .lock()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::NotFound(format!("user {id}")))
    }

    async fn update(&self, user: &User) -> Result<(), AuthError> {
        let mut table = self.table.lock().await;
        let row = table
            .rows
            .get_mut(&user.id)
            .ok_or_else(|| AuthError::NotFound(format!("user {}", user.id)))?;
        row.bio = user.bio.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn resolve_by_token(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<User, AuthError> {
        let user_id = self.tokens.resolve(scope, plaintext).await?;
        self.find_by_id(user_id).await
    }
}

// ---------------------------------------------------------------------------
// Workouts
// ---------------------------------------------------------------------------

#[derive(Default)]
struct WorkoutTable {
    next_workout_id: i64,
    next_entry_id: i64,
    rows: BTreeMap<i64, Workout>,
}

impl WorkoutTable {
    fn build_entries(&mut self, workout_id: i64, entries: &[NewWorkoutEntry]) -> Vec<WorkoutEntry> {
        let mut built: Vec<WorkoutEntry> = entries
            .iter()
            .map(|e| {
                self.next_entry_id += 1;
                WorkoutEntry {
                    id: self.next_entry_id,
                    workout_id,
                    exercise_name: e.exercise_name.clone(),
                    sets: e.sets,
                    reps: e.reps,
                    duration_seconds: e.duration_seconds,
                    weight: e.weight,
                    notes: e.notes.clone(),
                    order_index: e.order_index,
                }
            })
            .collect();
        built.sort_by_key(|e| e.order_index);
        built
    }
}

/// Workout store holding whole aggregates.
pub struct MemoryWorkoutStore {
    policy: EntryPolicy,
    table: Mutex<WorkoutTable>,
}

impl MemoryWorkoutStore {
    pub fn new(policy: EntryPolicy) -> Self {
        Self {
            policy,
            table: Mutex::new(WorkoutTable::default()),
        }
    }

    /// Number of stored workouts.
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
    async fn create(&self, workout: NewWorkout) -> Result<Workout, WorkoutError> {
        validate_workout_fields(
            &workout.title,
            workout.duration_minutes,
            workout.calories_burned,
        )?;
        self.policy.validate(&workout.entries)?;

        let mut table = self.table.lock().await;
        table.next_workout_id += 1;
        let id = table.next_workout_id;
        let entries = table.build_entries(id, &workout.entries);
        let now = Utc::now();
        let stored = Workout {
            id,
            user_id: workout.user_id,
            title: workout.title,
            description: workout.description,
            duration_minutes: workout.duration_minutes,
            calories_burned: workout.calories_burned,
            entries,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> Result<Workout, WorkoutError> {
        self.table
            .lock()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(WorkoutError::NotFound(id))
    }

    async fn get_owner(&self, id: i64) -> Result<i64, WorkoutError> {
        self.table
            .lock()
            .await
            .rows
            .get(&id)
            .map(|w| w.user_id)
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

        let mut table = self.table.lock().await;
        if !table.rows.contains_key(&update.id) {
            return Err(WorkoutError::NotFound(update.id));
        }
        let replacement = update
            .entries
            .as_deref()
            .map(|entries| table.build_entries(update.id, entries));

        let row = table
            .rows
            .get_mut(&update.id)
            .ok_or(WorkoutError::NotFound(update.id))?;
        row.title = update.title;
        row.description = update.description;
        row.duration_minutes = update.duration_minutes;
        row.calories_burned = update.calories_burned;
        if let Some(entries) = replacement {
            row.entries = entries;
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), WorkoutError> {
        self.table
            .lock()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(WorkoutError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn entry(name: &str, order_index: i32) -> NewWorkoutEntry {
        NewWorkoutEntry {
            exercise_name: name.into(),
            sets: 3,
            reps: Some(10),
            duration_seconds: None,
            weight: Some(135.5),
            notes: "warm up properly".into(),
            order_index,
        }
    }

    fn new_workout(user_id: i64, entries: Vec<NewWorkoutEntry>) -> NewWorkout {
        NewWorkout {
            user_id,
            title: "push day".into(),
            description: "upper body day".into(),
            duration_minutes: 60,
            calories_burned: 200,
            entries,
        }
    }

    fn stores() -> (Arc<MemoryTokenStore>, MemoryUserStore) {
        let tokens = Arc::new(MemoryTokenStore::new());
        let users = MemoryUserStore::new(PasswordCodec::new(TEST_COST), tokens.clone());
        (tokens, users)
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice".into(),
            email: "a@x.com".into(),
            bio: None,
        }
    }

    // -- tokens ---------------------------------------------------------------

    #[tokio::test]
    async fn issue_then_resolve_returns_user() {
        let tokens = MemoryTokenStore::new();
        let token = tokens
            .issue(42, Duration::hours(24), TokenScope::Authentication)
            .await
            .unwrap();
        let user_id = tokens
            .resolve(TokenScope::Authentication, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(42, user_id);
    }

    #[tokio::test]
    async fn only_fingerprint_is_stored() {
        let tokens = MemoryTokenStore::new();
        let token = tokens
            .issue(1, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        assert!(!tokens.contains_fingerprint(&token.plaintext).await);
        assert!(tokens.contains_fingerprint(&fingerprint(&token.plaintext)).await);
    }

    #[tokio::test]
    async fn tampered_or_expired_tokens_do_not_resolve() {
        let tokens = MemoryTokenStore::new();
        let live = tokens
            .issue(1, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        let mut tampered = live.plaintext.clone();
        tampered.pop();
        tampered.push('!');
        let err = tokens
            .resolve(TokenScope::Authentication, &tampered)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));

        let expired = tokens
            .issue(1, Duration::seconds(-1), TokenScope::Authentication)
            .await
            .unwrap();
        let err = tokens
            .resolve(TokenScope::Authentication, &expired.plaintext)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn revoke_all_invalidates_every_token_of_user() {
        let tokens = MemoryTokenStore::new();
        let a = tokens
            .issue(1, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        let b = tokens
            .issue(1, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        let other = tokens
            .issue(2, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();

        tokens
            .revoke_all(1, TokenScope::Authentication)
            .await
            .unwrap();

        for t in [&a, &b] {
            assert!(
                tokens
                    .resolve(TokenScope::Authentication, &t.plaintext)
                    .await
                    .is_err()
            );
        }
        assert_eq!(
            2,
            tokens
                .resolve(TokenScope::Authentication, &other.plaintext)
                .await
                .unwrap()
        );
    }

    // -- users ----------------------------------------------------------------

    #[tokio::test]
    async fn create_user_hashes_password() {
        let (_, users) = stores();
        let user = users.create(alice(), "secret123").await.unwrap();
        assert_eq!("alice", user.username);
        assert_ne!("secret123", user.password_hash.as_str());
        assert!(
            PasswordCodec::new(TEST_COST)
                .verify(&user.password_hash, "secret123")
                .unwrap()
        );
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let (_, users) = stores();
        users.create(alice(), "secret123").await.unwrap();

        let same_name = NewUser {
            email: "other@x.com".into(),
            ..alice()
        };
        let err = users.create(same_name, "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let same_email = NewUser {
            username: "bob".into(),
            ..alice()
        };
        let err = users.create(same_email, "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookups_report_not_found() {
        let (_, users) = stores();
        assert!(matches!(
            users.find_by_username("ghost").await.unwrap_err(),
            AuthError::NotFound(_)
        ));
        assert!(matches!(
            users.find_by_id(99).await.unwrap_err(),
            AuthError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn update_changes_bio_only() {
        let (_, users) = stores();
        let mut user = users.create(alice(), "secret123").await.unwrap();
        user.bio = "lifts things".into();
        user.username = "mallory".into();
        users.update(&user).await.unwrap();

        let stored = users.find_by_id(user.id).await.unwrap();
        assert_eq!("lifts things", stored.bio);
        assert_eq!("alice", stored.username);

        user.id = 1234;
        assert!(matches!(
            users.update(&user).await.unwrap_err(),
            AuthError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn resolve_by_token_returns_owner() {
        let (tokens, users) = stores();
        let user = users.create(alice(), "secret123").await.unwrap();
        let token = tokens
            .issue(user.id, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        let resolved = users
            .resolve_by_token(TokenScope::Authentication, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(user.id, resolved.id);
    }

    // -- workouts -------------------------------------------------------------

    #[tokio::test]
    async fn create_then_get_returns_entries_in_order() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let input = vec![entry("Squat", 2), entry("Bench Press", 1), entry("Row", 3)];
        let created = store.create(new_workout(1, input.clone())).await.unwrap();

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(input.len(), fetched.entries.len());
        let names: Vec<&str> = fetched
            .entries
            .iter()
            .map(|e| e.exercise_name.as_str())
            .collect();
        assert_eq!(vec!["Bench Press", "Squat", "Row"], names);
        for e in &fetched.entries {
            let original = input.iter().find(|i| i.order_index == e.order_index).unwrap();
            assert_eq!(original, &NewWorkoutEntry::from(e));
        }
    }

    #[tokio::test]
    async fn duplicate_order_index_persists_nothing() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let err = store
            .create(new_workout(1, vec![entry("a", 1), entry("b", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkoutError::Validation(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_replaces_entries_wholesale() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let created = store
            .create(new_workout(1, vec![entry("a", 1), entry("b", 2)]))
            .await
            .unwrap();

        store
            .update(WorkoutUpdate {
                id: created.id,
                title: "leg day".into(),
                description: created.description.clone(),
                duration_minutes: 45,
                calories_burned: 300,
                entries: Some(vec![entry("c", 1)]),
            })
            .await
            .unwrap();

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!("leg day", fetched.title);
        assert_eq!(1, fetched.entries.len());
        assert_eq!("c", fetched.entries[0].exercise_name);
    }

    #[tokio::test]
    async fn failed_update_leaves_workout_untouched() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let created = store
            .create(new_workout(1, vec![entry("a", 1)]))
            .await
            .unwrap();

        let err = store
            .update(WorkoutUpdate {
                id: created.id,
                title: "changed".into(),
                description: String::new(),
                duration_minutes: 1,
                calories_burned: 1,
                entries: Some(vec![entry("x", 1), entry("y", 1)]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkoutError::Validation(_)));

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!("push day", fetched.title);
        assert_eq!("a", fetched.entries[0].exercise_name);
    }

    #[tokio::test]
    async fn update_without_entries_keeps_them() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let created = store
            .create(new_workout(1, vec![entry("a", 1)]))
            .await
            .unwrap();
        store
            .update(WorkoutUpdate {
                id: created.id,
                title: "renamed".into(),
                description: String::new(),
                duration_minutes: 60,
                calories_burned: 200,
                entries: None,
            })
            .await
            .unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(created.entries, fetched.entries);
    }

    #[tokio::test]
    async fn missing_workouts_are_not_found() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        assert!(matches!(
            store.get_by_id(7).await.unwrap_err(),
            WorkoutError::NotFound(7)
        ));
        assert!(matches!(
            store.get_owner(7).await.unwrap_err(),
            WorkoutError::NotFound(7)
        ));
        assert!(matches!(
            store.delete(7).await.unwrap_err(),
            WorkoutError::NotFound(7)
        ));
    }

    #[tokio::test]
    async fn delete_removes_aggregate() {
        let store = MemoryWorkoutStore::new(EntryPolicy::default());
        let created = store
            .create(new_workout(5, vec![entry("a", 1)]))
            .await
            .unwrap();
        assert_eq!(5, store.get_owner(created.id).await.unwrap());
        store.delete(created.id).await.unwrap();
        assert!(store.get_by_id(created.id).await.is_err());
    }
}
