use crate::errors::Result;
use crate::models::Series;
use crate::render::ChartRenderer;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

pub const Y_AXIS_TITLE: &str = "Average Time Between Events (hours)";

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 260.0;
const PADDING_X: f64 = 56.0;
const PADDING_Y: f64 = 34.0;
const TOP: f64 = 24.0;
const TICKS: usize = 4;
const MAX_X_LABELS: usize = 8;

/// Writes the chart as a standalone HTML page.
#[derive(Debug, Clone)]
pub struct HtmlChartRenderer {
    path: PathBuf,
    title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub path: PathBuf,
    pub series: usize,
    pub points: usize,
}

impl HtmlChartRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: "Event Intervals".to_string(),
        }
    }
}

#[async_trait]
impl ChartRenderer for HtmlChartRenderer {
    type Chart = RenderedChart;

    async fn draw(&mut self, series: &[Series]) -> Result<RenderedChart> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let updated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let page = render_page(&self.title, series, &updated);

        // The controller destroys the previous page before drawing, so the
        // file is written in place.
        fs::write(&self.path, page).await?;

        let chart = RenderedChart {
            path: self.path.clone(),
            series: series.len(),
            points: series.iter().map(|s| s.points.len()).sum(),
        };
        info!(
            path = %chart.path.display(),
            series = chart.series,
            points = chart.points,
            "chart rendered"
        );
        Ok(chart)
    }

    async fn destroy(&mut self, chart: RenderedChart) -> Result<()> {
        match fs::remove_file(&chart.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub fn render_page(title: &str, series: &[Series], updated: &str) -> String {
    INDEX_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{UPDATED}}", &escape_html(updated))
        .replace("{{CHART}}", &render_svg(series))
        .replace("{{LEGEND}}", &render_legend(series))
}

/// Line chart with a day-scaled x axis. Points without a date or a finite
/// value are left out of the drawing.
pub fn render_svg(series: &[Series]) -> String {
    let plotted: Vec<Vec<(NaiveDate, f64)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|p| Some((p.x?, p.y.filter(|v| v.is_finite())?)))
                .collect()
        })
        .collect();

    let days: BTreeSet<NaiveDate> = plotted.iter().flatten().map(|(day, _)| *day).collect();
    let (Some(&first), Some(&last)) = (days.first(), days.last()) else {
        return format!(
            r#"<svg id="eventChart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Event chart"><text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text></svg>"#
        );
    };

    let values = plotted.iter().flatten().map(|(_, value)| *value);
    let mut min = values.clone().fold(f64::INFINITY, f64::min).min(0.0);
    let mut max = values.fold(f64::NEG_INFINITY, f64::max).max(0.0);
    if min == max {
        min -= 1.0;
        max += 1.0;
    }

    let range = max - min;
    let span = (last - first).num_days();
    let x_step = if span > 0 {
        (WIDTH - PADDING_X * 2.0) / span as f64
    } else {
        0.0
    };
    let scale_y = (HEIGHT - TOP - PADDING_Y) / range;
    let x = |day: NaiveDate| {
        if span > 0 {
            PADDING_X + (day - first).num_days() as f64 * x_step
        } else {
            WIDTH / 2.0
        }
    };
    let y = |value: f64| HEIGHT - PADDING_Y - (value - min) * scale_y;

    let mut svg = format!(
        r#"<svg id="eventChart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Event chart">"#
    );

    for i in 0..=TICKS {
        let value = min + range * i as f64 / TICKS as f64;
        let y_pos = y(value);
        svg.push_str(&format!(
            r#"<line class="chart-grid" x1="{PADDING_X}" y1="{y_pos:.2}" x2="{:.2}" y2="{y_pos:.2}" />"#,
            WIDTH - PADDING_X
        ));
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{:.2}" y="{:.2}" text-anchor="end">{}</text>"#,
            PADDING_X - 10.0,
            y_pos + 4.0,
            format_axis_value(value)
        ));
    }

    svg.push_str(&format!(
        r#"<line class="chart-axis" x1="{PADDING_X}" y1="{0:.2}" x2="{1:.2}" y2="{0:.2}" />"#,
        y(0.0),
        WIDTH - PADDING_X
    ));

    let label_every = days.len().div_ceil(MAX_X_LABELS).max(1);
    for day in days.iter().step_by(label_every) {
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            x(*day),
            HEIGHT - PADDING_Y + 18.0,
            day.format("%m-%d")
        ));
    }

    svg.push_str(&format!(
        r#"<text class="chart-label" transform="rotate(-90)" x="{:.2}" y="14" text-anchor="middle">{Y_AXIS_TITLE}</text>"#,
        -(TOP + (HEIGHT - TOP - PADDING_Y) / 2.0)
    ));

    for (line, points) in series.iter().zip(&plotted) {
        if points.is_empty() {
            continue;
        }
        let color = line.color.to_hex();
        let path = points
            .iter()
            .enumerate()
            .map(|(index, (day, value))| {
                let command = if index == 0 { 'M' } else { 'L' };
                format!("{command} {:.2} {:.2}", x(*day), y(*value))
            })
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(
            r#"<path class="chart-line" d="{path}" stroke="{color}"><title>{}</title></path>"#,
            escape_html(&line.label)
        ));
        for (day, value) in points {
            svg.push_str(&format!(
                r#"<circle class="chart-point" cx="{:.2}" cy="{:.2}" r="4" stroke="{color}" />"#,
                x(*day),
                y(*value)
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn render_legend(series: &[Series]) -> String {
    series
        .iter()
        .map(|s| {
            format!(
                r#"<li><span class="swatch" style="background: {}"></span>{}</li>"#,
                s.color,
                escape_html(&s.label)
            )
        })
        .collect()
}

fn format_axis_value(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 20px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    #eventChart {
      width: 100%;
      height: 260px;
      display: block;
    }

    .chart-line {
      fill: none;
      stroke-width: 3;
    }

    .chart-point {
      fill: white;
      stroke-width: 2;
    }

    .chart-grid {
      stroke: rgba(47, 72, 88, 0.12);
    }

    .chart-axis {
      stroke: rgba(47, 72, 88, 0.25);
      stroke-dasharray: 4 6;
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .legend {
      list-style: none;
      margin: 0;
      padding: 0;
      display: flex;
      flex-wrap: wrap;
      gap: 14px;
    }

    .swatch {
      display: inline-block;
      width: 12px;
      height: 12px;
      border-radius: 3px;
      margin-right: 6px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
      <p class="subtitle">Updated {{UPDATED}}</p>
    </header>
    <div class="chart-card">
      {{CHART}}
    </div>
    <ul class="legend">{{LEGEND}}</ul>
  </main>
</body>
</html>
"#;
