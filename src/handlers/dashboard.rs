use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::fs;
use tower_sessions::Session;

use crate::charts;
use crate::config::{Config, SchemaKind};
use crate::engine::{aggregate, AggregateOptions, EntryFilter, GroupBy, WeeklySummary};
use crate::errors::{AppError, AppResult};
use crate::handlers::current_user;
use crate::models::{FilterForm, SessionUser, ValueSchema};
use crate::services::StoreService;

pub async fn serve_dashboard(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
    Query(filter_form): Query<FilterForm>,
) -> AppResult<Response> {
    let user = current_user(&session).await?;
    tracing::info!("Rendering dashboard for user: {}", user.username);

    let summaries = weekly_summaries(&store_service, &config, &user, filter_form).await?;
    let schema = config.engine.value_schema();

    let dashboard_html = fs::read_to_string("templates/dashboard.html").map_err(|e| {
        tracing::error!("Failed to read dashboard template: {}", e);
        AppError::File(e)
    })?;

    let rows_html = summaries
        .iter()
        .map(|summary| {
            format!(
                r#"<tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{:.1}</td>
                    <td>{:.1}%</td>
                </tr>"#,
                summary.user,
                summary.project.as_deref().unwrap_or("-"),
                summary.week_label,
                summary.total,
                summary.utilization_percent(&schema),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let unit = match config.engine.value_schema {
        SchemaKind::Hours => "Hours",
        SchemaKind::Percentage => "Percent",
    };
    let admin_link = if user.is_admin() {
        r#"<a href="/admin">Team view</a>"#
    } else {
        ""
    };
    let dashboard_html = dashboard_html
        .replace("{{username}}", &user.username)
        .replace("{{rows}}", &rows_html)
        .replace("{{unit}}", unit)
        .replace("{{row_count}}", &summaries.len().to_string())
        .replace("{{admin_link}}", admin_link);

    Ok(Html(dashboard_html).into_response())
}

pub async fn export_csv(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
    Query(filter_form): Query<FilterForm>,
) -> AppResult<Response> {
    let user = current_user(&session).await?;
    tracing::info!("CSV export requested by user: {}", user.username);

    let summaries = weekly_summaries(&store_service, &config, &user, filter_form).await?;
    let csv = summaries_to_csv(&summaries, &config.engine.value_schema());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"utilization_summary.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn serve_chart(
    State((store_service, config)): State<(StoreService, Config)>,
    session: Session,
    Query(filter_form): Query<FilterForm>,
) -> AppResult<Response> {
    let user = current_user(&session).await?;

    let summaries = weekly_summaries(&store_service, &config, &user, filter_form).await?;
    let svg = charts::utilization_chart(&summaries, &config.engine.value_schema())?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// The shared dashboard pipeline: snapshot the store, filter, aggregate.
/// Admins may filter by any user; everyone else is pinned to their own
/// entries regardless of what the query says.
async fn weekly_summaries(
    store_service: &StoreService,
    config: &Config,
    user: &SessionUser,
    filter_form: FilterForm,
) -> AppResult<Vec<WeeklySummary>> {
    let filter = EntryFilter {
        user: if user.is_admin() {
            filter_form.user
        } else {
            Some(user.username.clone())
        },
        project: filter_form.project,
        from: filter_form.from,
        to: filter_form.to,
    };

    let entries = store_service.read_all_entries().await?;
    let filtered = filter.apply(&entries);

    let options = AggregateOptions {
        group_by: GroupBy::UserProjectWeek,
        week_policy: config.engine.week_policy,
        clip_policy: config.engine.clip_policy,
    };
    Ok(aggregate(&filtered, &options))
}

fn summaries_to_csv(summaries: &[WeeklySummary], schema: &ValueSchema) -> String {
    let mut csv = String::from("user,project,week,total,utilization\n");
    for summary in summaries {
        csv.push_str(&format!(
            "{},{},{},{},{:.2}\n",
            csv_field(&summary.user),
            csv_field(summary.project.as_deref().unwrap_or("")),
            csv_field(&summary.week_label),
            summary.total,
            summary.utilization_percent(schema),
        ));
    }
    csv
}

// Minimal quoting: only fields containing a comma or quote need escaping.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(user: &str, project: &str, total: f64) -> WeeklySummary {
        WeeklySummary {
            user: user.to_string(),
            project: Some(project.to_string()),
            week_start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            week_label: "08/01".to_string(),
            total,
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_summary() {
        let schema = ValueSchema::Hours { weekly_capacity: 40.0 };
        let csv = summaries_to_csv(&[summary("alex", "apollo", 20.0)], &schema);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "user,project,week,total,utilization");
        assert_eq!(lines[1], "alex,apollo,08/01,20,50.00");
    }

    #[test]
    fn csv_quotes_fields_containing_commas() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
