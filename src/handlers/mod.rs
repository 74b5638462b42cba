mod admin;
mod auth;
mod dashboard;
mod entry;

pub use admin::{forecast_json, serve_admin_dashboard, serve_team_chart};
pub use auth::{handle_login, handle_logout, handle_register, serve_login_page};
pub use dashboard::{export_csv, serve_chart, serve_dashboard};
pub use entry::{serve_entry_page, submit_entry};

use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::models::SessionUser;

/// The logged-in identity for this request, or an authentication error.
pub(crate) async fn current_user(session: &Session) -> AppResult<SessionUser> {
    session
        .get::<SessionUser>("user_session")
        .await
        .map_err(|e| AppError::Auth(format!("Session error: {}", e)))?
        .ok_or_else(|| AppError::Auth("Not authenticated".into()))
}

pub(crate) async fn require_admin(session: &Session) -> AppResult<SessionUser> {
    let user = current_user(session).await?;
    if !user.is_admin() {
        return Err(AppError::Auth("Admin access required".into()));
    }
    Ok(user)
}
