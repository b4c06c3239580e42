// Runtime settings. Everything has a working default; environment variables
// only exist to point the client at another host or to slow polling down.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://athenecurricula.org";

/// Settings shared by the transport, the session coordinator and the poller.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Scheme and host of the grading service, without a trailing slash.
    pub base_url: String,
    /// Minimum time between two status requests while waiting for grading.
    pub poll_interval: Duration,
    /// Granularity of the elapsed-time display.
    pub tick: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(2000),
            tick: Duration::from_millis(1000),
        }
    }
}

impl Settings {
    /// Read `ATHENE_BASE_URL`, `ATHENE_POLL_INTERVAL_MS` and `ATHENE_TICK_MS`,
    /// falling back to the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("ATHENE_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.base_url),
            poll_interval: env_millis("ATHENE_POLL_INTERVAL_MS").unwrap_or(default.poll_interval),
            tick: env_millis("ATHENE_TICK_MS").unwrap_or(default.tick),
        }
    }

    /// Build settings for a given host, keeping the default timings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn assignment_url(&self, assignment_id: &str) -> String {
        format!("{}/problem/{}/", self.base_url, assignment_id)
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_problem_url_from_id() {
        let settings = Settings::default();
        assert_eq!(
            settings.assignment_url("abc123"),
            "https://athenecurricula.org/problem/abc123/"
        );
    }

    #[test]
    fn strips_trailing_slash_from_base() {
        let settings = Settings::with_base_url("http://127.0.0.1:1234/");
        assert_eq!(settings.assignment_url("x"), "http://127.0.0.1:1234/problem/x/");
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
    }
}
