//! crates/report_dashboard_core/src/seed.rs
//!
//! Sample reports written on the very first session.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::Report;

const SAMPLES: [(&str, &str); 3] = [
    ("First Sample Report", "<p>This is a sample report content.</p>"),
    ("Second Sample Report", "<p>This is a second sample report content.</p>"),
    ("Third Sample Report", "<p>This is a third sample report content.</p>"),
];

/// Builds the three sample reports with fresh ids and the current time.
pub fn sample_reports() -> Vec<Report> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .map(|(title, content)| Report {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            summary: None,
        })
        .collect()
}
