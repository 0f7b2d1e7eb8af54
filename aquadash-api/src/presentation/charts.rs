//! Chart specifications.
//!
//! Each chart is a Plotly figure (`data` + `layout`) built as JSON and
//! rendered client-side by plotly.js. Acceptable ranges are drawn as
//! shaded horizontal bands behind the traces.

use aquadash_core::{
    AcceptableRange, Insights, Measurement, ObservationRow, ObservationTable, QualityLabel,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Fill colour of acceptable-range bands.
const BAND_FILL: &str = "rgba(46, 160, 67, 0.12)";

const SAFE_COLOUR: &str = "green";
const UNSAFE_COLOUR: &str = "red";

/// One chart on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// DOM id of the container element.
    pub id: &'static str,
    pub title: String,
    /// Plotly figure: `{"data": [...], "layout": {...}}`.
    pub figure: Value,
}

/// All dashboard charts in display order.
pub fn build_charts(table: &ObservationTable, insights: &Insights) -> Vec<ChartSpec> {
    vec![
        ph_over_time(table, insights),
        unsafe_by_city(insights),
        turbidity_over_time(table, insights),
        hardness_over_time(table, insights),
    ]
}

/// pH per city as lines over time, with the pH band.
pub fn ph_over_time(table: &ObservationTable, insights: &Insights) -> ChartSpec {
    measurement_lines(
        "chart-ph",
        "pH Levels Over Time",
        "pH Level",
        Measurement::Ph,
        table,
        insights,
    )
}

/// Hardness per city as lines over time, with the hardness band.
pub fn hardness_over_time(table: &ObservationTable, insights: &Insights) -> ChartSpec {
    measurement_lines(
        "chart-hardness",
        "Hardness Levels Over Time",
        "Hardness (mg/L)",
        Measurement::Hardness,
        table,
        insights,
    )
}

/// Unsafe incidents per city as a bar chart on a red scale.
pub fn unsafe_by_city(insights: &Insights) -> ChartSpec {
    let cities: Vec<&str> = insights.unsafe_by_city.keys().map(String::as_str).collect();
    let counts: Vec<usize> = insights.unsafe_by_city.values().copied().collect();

    let figure = json!({
        "data": [{
            "type": "bar",
            "name": "Unsafe Count",
            "x": cities,
            "y": counts,
            "marker": {
                "color": counts,
                "colorscale": "Reds",
                "showscale": true,
                "colorbar": { "title": { "text": "Unsafe Count" } },
            },
        }],
        "layout": layout(
            "Unsafe Water Quality Incidents by City",
            "City",
            "Count of Unsafe Reports",
            Vec::new(),
        ),
    });

    ChartSpec {
        id: "chart-unsafe-by-city",
        title: "Unsafe Water Quality Incidents by City".to_string(),
        figure,
    }
}

/// Turbidity over time as points coloured by quality, with the turbidity band.
pub fn turbidity_over_time(table: &ObservationTable, insights: &Insights) -> ChartSpec {
    let title = "Turbidity Levels Over Time";
    let traces: Vec<Value> = [
        (QualityLabel::Safe, SAFE_COLOUR),
        (QualityLabel::Unsafe, UNSAFE_COLOUR),
    ]
    .iter()
    .filter_map(|(label, colour)| {
        let mut rows: Vec<&ObservationRow> =
            table.iter().filter(|row| row.quality == *label).collect();
        if rows.is_empty() {
            return None;
        }
        rows.sort_by_key(|row| row.date_time);
        Some(json!({
            "type": "scatter",
            "mode": "markers",
            "name": label.as_db_str(),
            "x": timestamps(&rows),
            "y": values(&rows, Measurement::Turbidity),
            "marker": { "color": colour },
        }))
    })
    .collect();

    ChartSpec {
        id: "chart-turbidity",
        title: title.to_string(),
        figure: json!({
            "data": traces,
            "layout": layout(
                title,
                "Date",
                "Turbidity Level (NTU)",
                band(insights, Measurement::Turbidity)
            ),
        }),
    }
}

fn measurement_lines(
    id: &'static str,
    title: &str,
    y_title: &str,
    measurement: Measurement,
    table: &ObservationTable,
    insights: &Insights,
) -> ChartSpec {
    let traces: Vec<Value> = table
        .cities()
        .into_iter()
        .map(|city| {
            let mut rows: Vec<&ObservationRow> =
                table.iter().filter(|row| row.city == city).collect();
            rows.sort_by_key(|row| row.date_time);
            json!({
                "type": "scatter",
                "mode": "lines",
                "name": city,
                "x": timestamps(&rows),
                "y": values(&rows, measurement),
            })
        })
        .collect();

    ChartSpec {
        id,
        title: title.to_string(),
        figure: json!({
            "data": traces,
            "layout": layout(title, "Date", y_title, band(insights, measurement)),
        }),
    }
}

fn timestamps(rows: &[&ObservationRow]) -> Vec<String> {
    rows.iter().map(|row| row.date_time.to_rfc3339()).collect()
}

fn values(rows: &[&ObservationRow], measurement: Measurement) -> Vec<f64> {
    rows.iter().map(|row| row.value_of(measurement)).collect()
}

/// Shaded band for `measurement`, or nothing if the range is unknown.
fn band(insights: &Insights, measurement: Measurement) -> Vec<Value> {
    insights
        .acceptable_ranges
        .get(&measurement)
        .map(|range| vec![band_shape(range)])
        .unwrap_or_default()
}

fn band_shape(range: &AcceptableRange) -> Value {
    json!({
        "type": "rect",
        "xref": "paper",
        "x0": 0,
        "x1": 1,
        "yref": "y",
        "y0": range.low,
        "y1": range.high,
        "fillcolor": BAND_FILL,
        "line": { "width": 0 },
        "layer": "below",
    })
}

fn layout(title: &str, x_title: &str, y_title: &str, shapes: Vec<Value>) -> Value {
    json!({
        "title": { "text": title },
        "xaxis": { "title": { "text": x_title } },
        "yaxis": { "title": { "text": y_title } },
        "shapes": shapes,
        "margin": { "t": 48, "r": 16, "b": 48, "l": 56 },
    })
}
