//! Request and response bodies.

use chrono::{DateTime, Utc};
use liftlog_core::models::auth::User;
use liftlog_core::models::workout::{NewWorkoutEntry, Workout};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `POST /users`
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("bio", &self.bio)
            .finish_non_exhaustive()
    }
}

/// `PATCH /users/me`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// `POST /tokens/authentication`
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
    pub expiry: DateTime<Utc>,
}

/// `POST /workouts`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub calories_burned: i32,
    #[serde(default)]
    pub entries: Vec<NewWorkoutEntry>,
}

/// `PUT /workouts/{id}`: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub entries: Option<Vec<NewWorkoutEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutResponse {
    pub workout: Workout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_requests_never_debug_the_password() {
        let register: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","email":"alice@example.com","password":"hunter2-plaintext"}"#,
        )
        .unwrap();
        let shown = format!("{register:?}");
        assert!(shown.contains("alice@example.com"));
        assert!(!shown.contains("hunter2-plaintext"));

        let login = LoginRequest {
            username: "alice".into(),
            password: "hunter2-plaintext".into(),
        };
        assert!(!format!("{login:?}").contains("hunter2-plaintext"));
    }
}
