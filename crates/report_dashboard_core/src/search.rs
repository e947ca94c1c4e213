//! crates/report_dashboard_core/src/search.rs
//!
//! Title search over the report list, plus the debouncer that sits between
//! raw keystrokes and the filter.

use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::Report;

/// Default quiet period before a search query is applied.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Returns the reports whose title contains `query`, ignoring case and
/// surrounding whitespace. A blank query returns every report in order.
pub fn filter_reports(reports: &[Report], query: &str) -> Vec<Report> {
    let query = query.trim();
    if query.is_empty() {
        return reports.to_vec();
    }

    let needle = query.to_lowercase();
    reports
        .iter()
        .filter(|report| report.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

//=========================================================================================
// Debouncer
//=========================================================================================

/// Publishes the latest pushed value once no new value has arrived for `delay`.
///
/// Must be created inside a Tokio runtime. The background task stops when the
/// debouncer is dropped.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    shutdown: CancellationToken,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);
        let shutdown = CancellationToken::new();

        tokio::spawn(debounce_loop(input_rx, output_tx, delay, shutdown.clone()));

        Self {
            input,
            output,
            shutdown,
        }
    }

    /// Records a new raw value and restarts the quiet period.
    pub fn push(&self, value: T) {
        self.input.send_replace(value);
    }

    /// The most recently settled value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Treats every line of `input` as a freshly typed query and calls
/// `on_settled` for each query that stayed unchanged for `delay`.
///
/// A query still waiting when the input ends is settled right away.
pub async fn debounce_lines<R, F>(input: R, delay: Duration, mut on_settled: F) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str),
{
    let debouncer = Debouncer::new(String::new(), delay);
    let mut settled = debouncer.subscribe();
    let mut lines = input.lines();
    let mut pending: Option<String> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(query) => {
                    debouncer.push(query.clone());
                    pending = Some(query);
                }
                None => break,
            },
            changed = settled.changed() => {
                if changed.is_err() {
                    break;
                }
                let query = settled.borrow_and_update().clone();
                if pending.as_deref() == Some(query.as_str()) {
                    pending = None;
                }
                on_settled(&query);
            }
        }
    }

    if let Some(query) = pending {
        on_settled(&query);
    }
    Ok(())
}

async fn debounce_loop<T>(
    mut input: watch::Receiver<T>,
    output: watch::Sender<T>,
    delay: Duration,
    shutdown: CancellationToken,
) where
    T: Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = input.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Wait for a full quiet period; every new value restarts the timer.
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {
                    let settled = input.borrow_and_update().clone();
                    output.send_replace(settled);
                    break;
                }
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
    debug!("Debouncer stopped");
}
