use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::fs;
use tower_sessions::Session;
use uuid::Uuid;

use crate::config::{Config, SchemaKind};
use crate::errors::{AppError, AppResult};
use crate::handlers::current_user;
use crate::models::{EntryForm, EntryValue, UtilizationEntry};
use crate::services::StoreService;

pub async fn serve_entry_page(
    State((_, config)): State<(StoreService, Config)>,
) -> AppResult<Response> {
    let entry_html = fs::read_to_string("templates/entry.html").map_err(|e| {
        tracing::error!("Failed to read entry template: {}", e);
        AppError::File(e)
    })?;

    let (unit, max_value) = match config.engine.value_schema {
        SchemaKind::Hours => ("hours", config.engine.weekly_capacity),
        SchemaKind::Percentage => ("%", 100.0),
    };
    let entry_html = entry_html
        .replace("{{unit}}", unit)
        .replace("{{max_value}}", &max_value.to_string());

    Ok(Html(entry_html).into_response())
}

pub async fn submit_entry(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
    Form(entry_form): Form<EntryForm>,
) -> AppResult<Response> {
    let user = current_user(&session).await?;

    let project = entry_form.project.trim();
    if project.is_empty() {
        return Err(AppError::Validation("project name must not be empty".to_string()));
    }

    let value = match config.engine.value_schema {
        SchemaKind::Hours => EntryValue::Hours(entry_form.value),
        SchemaKind::Percentage => EntryValue::Percentage(entry_form.value),
    };
    // Reject out-of-range values before anything is persisted.
    value.validate(&config.engine.value_schema())?;

    let description = entry_form.description.trim();
    let entry = UtilizationEntry {
        id: Uuid::new_v4(),
        user: user.username.clone(),
        project: project.to_string(),
        description: (!description.is_empty()).then(|| description.to_string()),
        week_ending: entry_form.week_ending,
        value,
        submitted_at: Utc::now(),
    };

    store_service.append_entry(&entry).await?;
    tracing::info!(
        "Recorded utilization entry for user {} on project {}",
        user.username,
        entry.project
    );

    Ok(Redirect::to("/dashboard").into_response())
}
