use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use tower_sessions::Session;

use crate::charts;
use crate::config::Config;
use crate::engine::{
    aggregate, forecast, team_average_series, AggregateOptions, ForecastPoint, GroupBy,
};
use crate::errors::{AppError, AppResult};
use crate::handlers::require_admin;
use crate::models::UtilizationEntry;
use crate::services::StoreService;

pub async fn serve_admin_dashboard(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
) -> AppResult<Response> {
    let user = require_admin(&session).await?;
    tracing::info!("Rendering admin dashboard for: {}", user.username);

    let entries = store_service.read_all_entries().await?;
    let history = team_history(&entries, &config);

    // Per-user weekly totals, projects collapsed.
    let user_options = AggregateOptions {
        group_by: GroupBy::UserWeek,
        week_policy: config.engine.week_policy,
        clip_policy: config.engine.clip_policy,
    };
    let schema = config.engine.value_schema();
    let user_rows = aggregate(&entries, &user_options)
        .iter()
        .map(|summary| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}%</td></tr>",
                summary.user,
                summary.week_label,
                summary.total,
                summary.utilization_percent(&schema)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let history_rows = history
        .iter()
        .map(|(week, average)| {
            format!(
                "<tr><td>{}</td><td>{:.1}%</td></tr>",
                week.format("%d/%m"),
                average
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    // An empty team has nothing to extrapolate from; the page just shows an
    // empty forecast section instead of failing.
    let forecast_rows = match project_forecast(&history, config.engine.forecast_horizon) {
        Ok(points) => points
            .iter()
            .map(|point| {
                format!(
                    "<tr><td>{}</td><td>{:.1}%</td><td>{}</td></tr>",
                    point.week.format("%d/%m"),
                    point.predicted,
                    point.series_label
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Err(_) => String::new(),
    };

    let admin_html = fs::read_to_string("templates/admin.html").map_err(|e| {
        tracing::error!("Failed to read admin template: {}", e);
        AppError::File(e)
    })?;
    let admin_html = admin_html
        .replace("{{username}}", &user.username)
        .replace("{{history_rows}}", &history_rows)
        .replace("{{user_rows}}", &user_rows)
        .replace("{{forecast_rows}}", &forecast_rows)
        .replace("{{week_count}}", &history.len().to_string());

    Ok(Html(admin_html).into_response())
}

pub async fn serve_team_chart(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
) -> AppResult<Response> {
    require_admin(&session).await?;

    let entries = store_service.read_all_entries().await?;
    let history = team_history(&entries, &config);
    let points = project_forecast(&history, config.engine.forecast_horizon).unwrap_or_default();
    let svg = charts::team_chart(&history, &points)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// Forecast points as JSON. Unlike the admin page, an empty history here is a
/// proper error response.
pub async fn forecast_json(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
) -> AppResult<Response> {
    require_admin(&session).await?;

    let entries = store_service.read_all_entries().await?;
    let history = team_history(&entries, &config);
    let points = project_forecast(&history, config.engine.forecast_horizon)?;

    let response = json!({
        "horizon": config.engine.forecast_horizon,
        "observed_weeks": history.len(),
        "points": points,
    });
    Ok(Json(response).into_response())
}

/// Team-wide average utilization per week: aggregate the snapshot, then
/// average across the summary rows of each week.
fn team_history(entries: &[UtilizationEntry], config: &Config) -> Vec<(NaiveDate, f64)> {
    let options = AggregateOptions {
        group_by: GroupBy::UserProjectWeek,
        week_policy: config.engine.week_policy,
        clip_policy: config.engine.clip_policy,
    };
    let summaries = aggregate(entries, &options);
    team_average_series(&summaries, &config.engine.value_schema())
}

fn project_forecast(
    history: &[(NaiveDate, f64)],
    horizon: usize,
) -> Result<Vec<ForecastPoint>, AppError> {
    let series: Vec<f64> = history.iter().map(|(_, average)| *average).collect();
    let last_week = history
        .last()
        .map(|(week, _)| *week)
        .ok_or(crate::engine::ForecastError::InsufficientData)?;
    Ok(forecast(&series, last_week, horizon)?)
}
