use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::engine::{ForecastPoint, WeeklySummary};
use crate::errors::{AppError, AppResult};
use crate::models::ValueSchema;

const CHART_SIZE: (u32, u32) = (900, 500);

/// Weekly utilization lines, one series per (user, project), rendered to an
/// SVG document.
pub fn utilization_chart(summaries: &[WeeklySummary], schema: &ValueSchema) -> AppResult<String> {
    let weeks: Vec<NaiveDate> = summaries
        .iter()
        .map(|summary| summary.week_start)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series: BTreeMap<String, Vec<(usize, f64)>> = BTreeMap::new();
    for summary in summaries {
        let name = match &summary.project {
            Some(project) => format!("{} / {}", summary.user, project),
            None => summary.user.clone(),
        };
        let week_index = weeks
            .binary_search(&summary.week_start)
            .unwrap_or_default();
        series
            .entry(name)
            .or_default()
            .push((week_index, summary.utilization_percent(schema)));
    }

    let y_max = summaries
        .iter()
        .map(|summary| summary.utilization_percent(schema))
        .fold(100.0f64, f64::max)
        * 1.1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Weekly Utilization by Project", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0usize..weeks.len().max(1), 0f64..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_labels(weeks.len().max(1))
            .x_label_formatter(&|index| {
                weeks
                    .get(*index)
                    .map(|week| week.format("%d/%m").to_string())
                    .unwrap_or_default()
            })
            .y_desc("Utilization (%)")
            .draw()
            .map_err(chart_err)?;

        for (color_index, (name, points)) in series.iter().enumerate() {
            let color = Palette99::pick(color_index).mix(0.9);
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                .map_err(chart_err)?
                .label(name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
        }

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(chart_err)?;
        }

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

/// Team average history with the forecast continuation, for the admin view.
/// Forecast values are drawn as-is, including any above 100%.
pub fn team_chart(history: &[(NaiveDate, f64)], forecast: &[ForecastPoint]) -> AppResult<String> {
    let labels: Vec<String> = history
        .iter()
        .map(|(week, _)| week.format("%d/%m").to_string())
        .chain(
            forecast
                .iter()
                .map(|point| point.week.format("%d/%m").to_string()),
        )
        .collect();

    let values: Vec<f64> = history
        .iter()
        .map(|(_, average)| *average)
        .chain(forecast.iter().map(|point| point.predicted))
        .collect();
    let y_min = values.iter().copied().fold(0.0f64, f64::min) * 1.05;
    let y_max = values.iter().copied().fold(100.0f64, f64::max) * 1.1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Average Team Utilization", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0usize..labels.len().max(1), y_min..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|index| labels.get(*index).cloned().unwrap_or_default())
            .y_desc("Utilization (%)")
            .draw()
            .map_err(chart_err)?;

        if !history.is_empty() {
            chart
                .draw_series(
                    LineSeries::new(
                        history.iter().enumerate().map(|(i, (_, avg))| (i, *avg)),
                        BLUE.stroke_width(2),
                    )
                    .point_size(3),
                )
                .map_err(chart_err)?
                .label("Observed")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLUE.stroke_width(2)));
        }

        if !forecast.is_empty() {
            // Anchor the forecast line at the last observed point so the
            // continuation reads as one trend.
            let anchor = history
                .len()
                .checked_sub(1)
                .map(|i| (i, history[i].1))
                .into_iter();
            let points = anchor.chain(
                forecast
                    .iter()
                    .enumerate()
                    .map(|(i, point)| (history.len() + i, point.predicted)),
            );
            chart
                .draw_series(LineSeries::new(points, RED.stroke_width(2)).point_size(3))
                .map_err(chart_err)?
                .label("Forecast")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn chart_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::forecast;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn summary(user: &str, project: &str, week_start: NaiveDate, total: f64) -> WeeklySummary {
        WeeklySummary {
            user: user.to_string(),
            project: Some(project.to_string()),
            week_start,
            week_label: week_start.format("%d/%m").to_string(),
            total,
        }
    }

    #[test]
    fn utilization_chart_renders_svg() {
        let schema = ValueSchema::Hours { weekly_capacity: 40.0 };
        let summaries = vec![
            summary("alex", "apollo", date(2024, 1, 8), 32.0),
            summary("alex", "apollo", date(2024, 1, 15), 38.0),
            summary("jamie", "borealis", date(2024, 1, 8), 20.0),
        ];
        let svg = utilization_chart(&summaries, &schema).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn utilization_chart_handles_empty_input() {
        let svg = utilization_chart(&[], &ValueSchema::Percentage).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn team_chart_renders_history_and_forecast() {
        let history = vec![
            (date(2024, 1, 8), 60.0),
            (date(2024, 1, 15), 70.0),
            (date(2024, 1, 22), 80.0),
        ];
        let series: Vec<f64> = history.iter().map(|(_, v)| *v).collect();
        let points = forecast(&series, date(2024, 1, 22), 2).unwrap();
        let svg = team_chart(&history, &points).unwrap();
        assert!(svg.contains("<svg"));
    }
}
