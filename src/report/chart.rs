//! Cumulative PnL line chart rendered as standalone SVG

use chrono::{Datelike, NaiveDate};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 640.0;
const PADDING: f64 = 60.0;
pub const STRATEGY_COLOR: &str = "#348dc1";
pub const BENCHMARK_COLOR: &str = "#ff9933";

/// One labelled line of the chart
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub label: String,
    pub color: &'static str,
    pub points: Vec<(NaiveDate, f64)>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn scale_y(value: f64, min_v: f64, max_v: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return HEIGHT / 2.0;
    }
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * (HEIGHT - 2.0 * PADDING)
}

fn scale_x(date: NaiveDate, first: NaiveDate, last: NaiveDate) -> f64 {
    let span = (last - first).num_days();
    if span == 0 {
        return WIDTH / 2.0;
    }
    let norm = (date - first).num_days() as f64 / span as f64;
    PADDING + norm * (WIDTH - 2.0 * PADDING)
}

/// Render all series on a shared date axis with a zero line and legend
pub fn render_pnl_chart(title: &str, series: &[ChartSeries]) -> String {
    let all_points = series.iter().flat_map(|s| s.points.iter());
    let (mut first, mut last) = (None::<NaiveDate>, None::<NaiveDate>);
    let (mut min_v, mut max_v) = (0.0_f64, 0.0_f64);
    for (date, value) in all_points {
        first = Some(first.map_or(*date, |d| d.min(*date)));
        last = Some(last.map_or(*date, |d| d.max(*date)));
        if value.is_finite() {
            min_v = min_v.min(*value);
            max_v = max_v.max(*value);
        }
    }

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><style>text{{font-family:Arial,sans-serif;font-size:12px;fill:#444}}</style>"#,
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        r##"<rect width="100%" height="100%" fill="#ffffff" /><text x="{x:.2}" y="{y:.2}" text-anchor="middle" style="font-size:16px;fill:#222">{title}</text>"##,
        x = WIDTH / 2.0,
        y = PADDING / 2.0,
        title = escape(title)
    ));

    let (Some(first), Some(last)) = (first, last) else {
        svg.push_str("</svg>");
        return svg;
    };

    // Horizontal grid with value labels
    for step in 0..=4 {
        let value = min_v + (max_v - min_v) * step as f64 / 4.0;
        let y = scale_y(value, min_v, max_v);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#e5e5e5" stroke-width="0.5" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="end">${value:.2}</text>"##,
            x1 = PADDING,
            x2 = WIDTH - PADDING,
            y = y,
            tx = PADDING - 6.0,
            ty = y + 4.0,
            value = value
        ));
    }

    // Zero line
    let zero = scale_y(0.0, min_v, max_v);
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = WIDTH - PADDING,
        y = zero
    ));

    // One tick per year along the date axis
    let axis_y = HEIGHT - PADDING;
    for year in first.year()..=last.year() {
        let Some(tick) = NaiveDate::from_ymd_opt(year, 1, 1) else {
            continue;
        };
        let tick = tick.max(first);
        let x = scale_x(tick, first, last);
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#ccc" stroke-width="1" /><text x="{x:.2}" y="{ty:.2}" text-anchor="middle">{year}</text>"##,
            x = x,
            y1 = axis_y,
            y2 = axis_y + 4.0,
            ty = axis_y + 18.0,
            year = year
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">Date</text><text x="{lx:.2}" y="{ly:.2}" text-anchor="middle" transform="rotate(-90 {lx:.2} {ly:.2})">Cumulative PnL ($)</text>"#,
        x = WIDTH / 2.0,
        y = HEIGHT - PADDING / 4.0,
        lx = PADDING / 4.0,
        ly = HEIGHT / 2.0
    ));

    for line in series {
        let points: Vec<String> = line
            .points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(d, v)| {
                format!(
                    "{:.2},{:.2}",
                    scale_x(*d, first, last),
                    scale_y(*v, min_v, max_v)
                )
            })
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{points}" />"#,
            color = line.color,
            points = points.join(" ")
        ));
    }

    // Legend, top-left inside the plot area
    let mut y = PADDING + 16.0;
    let x = PADDING + 12.0;
    for line in series {
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="2" /><text x="{tx:.2}" y="{y:.2}" fill="#333">{label}</text>"##,
            x1 = x,
            x2 = x + 24.0,
            ly = y - 4.0,
            color = line.color,
            tx = x + 30.0,
            y = y,
            label = escape(&line.label)
        ));
        y += 18.0;
    }

    svg.push_str("</svg>");
    svg
}
