//! Backend endpoint catalogue, relative to the API root.

/// Token issuance.
pub const AUTH_TOKEN: &str = "auth/token/";
/// Token refresh.
pub const AUTH_TOKEN_REFRESH: &str = "auth/token/refresh/";
/// Logout.
pub const AUTH_LOGOUT: &str = "auth/logout/";
/// Current user profile.
pub const AUTH_ME: &str = "auth/me/";
/// Account registration.
pub const AUTH_REGISTER: &str = "auth/register/";
/// Email verification.
pub const AUTH_VERIFY: &str = "auth/verify/";
/// Resend verification code.
pub const AUTH_RESEND: &str = "auth/resend/";
/// Password reset request.
pub const AUTH_PASSWORD_RESET: &str = "auth/password/reset/";
/// Password reset confirmation.
pub const AUTH_PASSWORD_CONFIRM: &str = "auth/password/confirm/";
/// Task collection.
pub const TASKS: &str = "tasks/";

/// Endpoints whose own 401 means the credentials are invalid.
///
/// Refreshing cannot help these, so a 401 from them ends the session.
const AUTH_CRITICAL: &[&str] = &[AUTH_TOKEN_REFRESH, AUTH_LOGOUT, AUTH_TOKEN];

/// Returns true if `path` targets an auth-critical endpoint.
///
/// Matching is by suffix on the `/`-prefixed path so it holds whatever
/// root the API is mounted under.
#[must_use]
pub fn is_auth_critical(path: &str) -> bool {
    let normalized = format!("/{}", path.trim_start_matches('/'));
    AUTH_CRITICAL
        .iter()
        .any(|endpoint| normalized.ends_with(&format!("/{endpoint}")))
}

/// Path of a single task.
#[must_use]
pub fn task(id: i64) -> String {
    format!("{TASKS}{id}/")
}

/// Path of the completion toggle for a task.
#[must_use]
pub fn task_toggle(id: i64) -> String {
    format!("{TASKS}{id}/toggle/")
}
