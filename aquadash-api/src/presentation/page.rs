//! Dashboard page rendering.

use std::fmt::Write as _;

use aquadash_core::{Insights, Measurement, Timestamp};
use aquadash_storage::CacheStatus;

use super::charts::ChartSpec;

/// plotly.js bundle loaded by the page.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#f6f8fa;color:#1f2328}\
header{padding:1.5rem 2rem;background:#0b3d91;color:#fff}\
main{padding:1.5rem 2rem}\
.summary{display:flex;gap:1rem;margin-bottom:1.5rem}\
.card{background:#fff;border-radius:8px;padding:1rem 1.5rem;box-shadow:0 1px 3px rgba(0,0,0,.12)}\
.card .value{font-size:2rem;font-weight:600}\
.safe .value{color:#1a7f37}.unsafe .value{color:#cf222e}\
.charts{display:grid;grid-template-columns:repeat(auto-fit,minmax(480px,1fr));gap:1rem}\
.chart{background:#fff;border-radius:8px;min-height:420px}\
footer{padding:0 2rem 1.5rem;color:#656d76;font-size:.85rem}";

/// Facts about the read behind this page, shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub cache_status: CacheStatus,
    pub fetched_at: Timestamp,
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Serialize `value` for embedding inside a `<script>` element.
///
/// `</` is split so a string value can never close the element early.
pub fn script_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Render the complete dashboard page.
pub fn render_dashboard(
    insights: &Insights,
    charts: &[ChartSpec],
    meta: PageMeta,
) -> Result<String, serde_json::Error> {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Water Quality Dashboard</title>\n");
    let _ = writeln!(html, "<script src=\"{}\"></script>", PLOTLY_CDN);
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str("<header><h1>Water Quality Dashboard</h1></header>\n<main>\n");

    html.push_str("<section class=\"summary\">\n");
    let _ = writeln!(
        html,
        "<div class=\"card safe\"><div class=\"label\">Safe readings</div><div class=\"value\" id=\"safe-count\">{}</div></div>",
        insights.safe_count
    );
    let _ = writeln!(
        html,
        "<div class=\"card unsafe\"><div class=\"label\">Unsafe readings</div><div class=\"value\" id=\"unsafe-count\">{}</div></div>",
        insights.unsafe_count
    );
    html.push_str(&ranges_card(insights));
    html.push_str("</section>\n");

    html.push_str("<section class=\"charts\">\n");
    for chart in charts {
        let _ = writeln!(
            html,
            "<div class=\"chart\" id=\"{}\" aria-label=\"{}\"></div>",
            escape_html(chart.id),
            escape_html(&chart.title)
        );
    }
    html.push_str("</section>\n</main>\n");

    let _ = writeln!(
        html,
        "<footer>{} readings &middot; cache: {} &middot; read at {} UTC</footer>",
        insights.total(),
        meta.cache_status,
        meta.fetched_at.format("%Y-%m-%d %H:%M:%S")
    );

    html.push_str("<script>\n");
    for chart in charts {
        let _ = writeln!(
            html,
            "(function(){{var f={};Plotly.newPlot({},f.data,f.layout,{{responsive:true}});}})();",
            script_json(&chart.figure)?,
            script_json(&chart.id)?
        );
    }
    html.push_str("</script>\n</body>\n</html>\n");

    Ok(html)
}

fn ranges_card(insights: &Insights) -> String {
    let mut items = String::new();
    for measurement in Measurement::ALL {
        if let Some(range) = insights.acceptable_ranges.get(&measurement) {
            let outside = insights
                .out_of_range_counts
                .get(&measurement)
                .copied()
                .unwrap_or(0);
            let _ = write!(
                items,
                "<li>{}: {} to {} ({} outside)</li>",
                escape_html(measurement.column()),
                range.low,
                range.high,
                outside
            );
        }
    }
    format!(
        "<div class=\"card ranges\"><div class=\"label\">Acceptable ranges</div><ul>{}</ul></div>\n",
        items
    )
}
