use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use bcrypt::{hash, DEFAULT_COST};
use std::fs;
use tower_sessions::Session;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{Credential, LoginForm, RegisterForm, Role, SessionUser};
use crate::services::{CredentialStore, StoreService};

pub async fn serve_login_page() -> impl IntoResponse {
    let login_html = fs::read_to_string("templates/login.html")
        .unwrap_or_else(|_| "Error loading login page".to_string());
    Html(login_html)
}

#[axum::debug_handler]
pub async fn handle_login(
    State((store_service, _)): State<(StoreService, Config)>,
    session: Session,
    Form(login_form): Form<LoginForm>,
) -> Response {
    tracing::info!("Login attempt for user: {}", login_form.username);

    match store_service.find_user(&login_form.username).await {
        Ok(Some(credential)) => {
            if credential.verify_password(&login_form.password) {
                tracing::info!("Password verified for user: {}", login_form.username);
                let session_user = SessionUser {
                    username: credential.username,
                    role: credential.role,
                };
                if let Err(e) = session.insert("user_session", session_user).await {
                    tracing::error!("Session error: {}", e);
                    return Redirect::to("/?error=Server%20error").into_response();
                }
                Redirect::to("/dashboard").into_response()
            } else {
                tracing::info!("Invalid password for user: {}", login_form.username);
                Redirect::to("/?error=Password%20is%20incorrect%2C%20please%20re-enter")
                    .into_response()
            }
        }
        Ok(None) => {
            tracing::info!("User not found: {}", login_form.username);
            Redirect::to("/?error=Username%20does%20not%20exist").into_response()
        }
        Err(e) => {
            tracing::error!("Redis error: {}", e);
            Redirect::to("/?error=Server%20error").into_response()
        }
    }
}

pub async fn handle_register(
    State((store_service, config)): State<(StoreService, Config)>,
    Form(register_form): Form<RegisterForm>,
) -> AppResult<Response> {
    if register_form.password != register_form.confirm_password {
        return Ok(Redirect::to("/?error=Passwords%20don't%20match&form=register").into_response());
    }

    // Admin role comes from the configured allow-list; everyone else is a
    // regular user.
    let role = if config.user.admin_usernames.contains(&register_form.username) {
        Role::Admin
    } else {
        Role::User
    };

    let password_hash = hash(register_form.password.as_bytes(), DEFAULT_COST)
        .map_err(|e| AppError::Auth(format!("Failed to hash password: {}", e)))?;
    let credential = Credential {
        username: register_form.username,
        password_hash,
        role,
    };

    // insert_user performs the pre-insert existence check.
    if !store_service.insert_user(&credential).await? {
        tracing::info!("Registration rejected, username taken: {}", credential.username);
        return Err(AppError::DuplicateUser(credential.username));
    }

    tracing::info!("Registered new user: {}", credential.username);
    // Only successful registration returns to the login form
    Ok(Redirect::to("/?error=Registration%20successful!%20Please%20login").into_response())
}

#[axum::debug_handler]
pub async fn handle_logout(session: Session) -> Response {
    if let Err(e) = session.remove::<SessionUser>("user_session").await {
        tracing::warn!("Session removal error: {}", e);
    }
    Redirect::to("/").into_response()
}
