// Published CSV sheets over HTTP, with retry and backoff

use std::thread;
use std::time::Duration;

use ctrlboard_config::SHEET_PLACEHOLDER;
use ctrlboard_core::RawTable;

use crate::error::LoadError;
use crate::source::TableSource;

const DEFAULT_MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("ctrlboard/", env!("CARGO_PKG_VERSION"));

/// Fetches `<template with {sheet} replaced>` and parses the body as CSV.
///
/// 404 means the sheet is not published. Other 4xx fail at once. 429 and
/// 5xx are retried with doubling backoff; 429 honours `Retry-After`.
/// Transport errors are retried the same way.
pub struct HttpCsvSource {
    http: reqwest::blocking::Client,
    url_template: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpCsvSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let url_template = url_template.into();
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LoadError::Network {
                url: url_template.clone(),
                message: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            url_template,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_secs(1),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// First wait between attempts; doubles after each retry.
    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    fn url_for(&self, sheet: &str) -> String {
        self.url_template.replace(SHEET_PLACEHOLDER, sheet)
    }

    /// GET with retry. `Ok(None)` on 404.
    fn get_text(&self, url: &str) -> Result<Option<String>, LoadError> {
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            match self.http.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 404 {
                        return Ok(None);
                    }

                    if (400..500).contains(&status) && status != 429 {
                        return Err(LoadError::Http {
                            status,
                            url: url.to_string(),
                        });
                    }

                    if status == 429 || status >= 500 {
                        if attempt == self.max_retries {
                            return Err(LoadError::Http {
                                status,
                                url: url.to_string(),
                            });
                        }

                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.trim().parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                        } else {
                            backoff
                        };

                        log::warn!(
                            "retry {}/{} in {:?} (HTTP {status} from {url})",
                            attempt + 1,
                            self.max_retries,
                            wait,
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    let text = resp.text().map_err(|e| LoadError::Network {
                        url: url.to_string(),
                        message: format!("failed to read response body: {e}"),
                    })?;
                    return Ok(Some(text));
                }
                Err(e) => {
                    if attempt == self.max_retries {
                        return Err(LoadError::Network {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    log::warn!(
                        "retry {}/{} in {:?} ({e})",
                        attempt + 1,
                        self.max_retries,
                        backoff,
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        // The loop returns on its last attempt.
        Err(LoadError::Network {
            url: url.to_string(),
            message: "retries exhausted".into(),
        })
    }
}

impl TableSource for HttpCsvSource {
    fn describe(&self) -> String {
        self.url_template.clone()
    }

    fn fetch(&self, sheet: &str) -> Result<Option<RawTable>, LoadError> {
        let url = self.url_for(sheet);
        log::debug!("GET {url}");
        match self.get_text(&url)? {
            Some(body) => crate::csv::import_from_string(&body, sheet).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn source(server: &MockServer) -> HttpCsvSource {
        HttpCsvSource::new(format!("{}/export/{{sheet}}", server.base_url()), Duration::from_secs(5))
            .unwrap()
            .with_backoff(Duration::ZERO)
    }

    #[test]
    fn fetches_and_parses_csv() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/export/PTAR");
            then.status(200)
                .header("content-type", "text/csv")
                .body("\u{feff}Institución,Año\nA,2025\nB,2024\n");
        });

        let t = source(&server).fetch("PTAR").unwrap().unwrap();
        mock.assert();
        assert_eq!(t.name, "PTAR");
        assert_eq!(t.columns, vec!["Institución", "Año"]);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn not_found_is_absent_sheet() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/export/CATALOGO");
            then.status(404);
        });
        assert!(source(&server).fetch("CATALOGO").unwrap().is_none());
    }

    #[test]
    fn forbidden_fails_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/export/PTAR");
            then.status(403);
        });
        let err = source(&server).fetch("PTAR").unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 403, .. }));
        mock.assert_calls(1);
    }

    #[test]
    fn rate_limit_retries_then_gives_up() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/export/PTAR");
            then.status(429).header("retry-after", "0");
        });
        let err = source(&server).fetch("PTAR").unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 429, .. }));
        mock.assert_calls(4);
    }

    #[test]
    fn server_error_respects_max_retries() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/export/PTAR");
            then.status(503);
        });
        let err = source(&server).with_max_retries(1).fetch("PTAR").unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
        mock.assert_calls(2);
    }

    #[test]
    fn describe_is_template() {
        let src = HttpCsvSource::new("https://x.test/{sheet}.csv", Duration::from_secs(1)).unwrap();
        assert_eq!(src.describe(), "https://x.test/{sheet}.csv");
        assert_eq!(src.url_for("PTCI"), "https://x.test/PTCI.csv");
    }
}
