use std::time::Duration;

use clap::ValueEnum;
use usersearch::{CancelToken, GitHubClient, RateLimitState, spawn_poller};

use crate::config::Config;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Handle the limits command.
///
/// Without `watch`, fetches the search bucket once. With `watch`, polls every
/// `watch` seconds until Ctrl+C.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    watch: Option<u64>,
    config: &Config,
    cancel: CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = GitHubClient::new(config.client_config()?)?;

    let Some(secs) = watch else {
        let state = client.get_rate_limit(&cancel).await?;
        println!("{}", RateLimitDisplay::from_state(&state).render(output)?);
        return Ok(());
    };

    let interval = Duration::from_secs(secs.max(1));
    let (mut rx, handle) = spawn_poller(client, interval, cancel.clone());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let current = *rx.borrow_and_update();
        if let Some(state) = current {
            if state.is_exhausted() {
                tracing::warn!(reset = state.reset, "Search rate limit exhausted");
            }
            println!("{}", RateLimitDisplay::from_state(&state).render(output)?);
        }
    }

    handle.await?;
    Ok(())
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_state(state: &RateLimitState) -> Self {
        Self::at(state, chrono::Utc::now())
    }

    fn at(state: &RateLimitState, now: chrono::DateTime<chrono::Utc>) -> Self {
        let usage_percent = if state.limit > 0 {
            (state.used as f64 / state.limit as f64) * 100.0
        } else {
            0.0
        };
        let reset_at = state.reset_at();
        let reset_duration = reset_at.signed_duration_since(now);
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            resource: "search".to_string(),
            limit: state.limit.to_string(),
            used: state.used.to_string(),
            remaining: state.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
            status: if state.is_exhausted() { "exhausted" } else { "ok" }.to_string(),
        }
    }

    pub(crate) fn render(self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(vec![self]);
                table.with(tabled::settings::Style::rounded());
                Ok(table.to_string())
            }
            OutputFormat::Json => serde_json::to_string_pretty(&self),
        }
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}
