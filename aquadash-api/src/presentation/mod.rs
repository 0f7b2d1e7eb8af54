//! Presentation adapter: insights and observations in, HTML page out.

pub mod charts;
pub mod page;

pub use charts::{build_charts, ChartSpec};
pub use page::{escape_html, render_dashboard, script_json, PageMeta, PLOTLY_CDN};
