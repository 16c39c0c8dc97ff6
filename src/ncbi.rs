use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::ProteomeError;

pub const TAXDUMP_URL: &str = "https://ftp.ncbi.nlm.nih.gov/pub/taxonomy/taxdmp.zip";

pub trait TaxonomyClient {
    fn source(&self) -> &str;
    fn download_dump(&self, destination: &Path) -> Result<(), ProteomeError>;
}

#[derive(Clone)]
pub struct NcbiTaxdumpClient {
    client: Client,
    url: String,
}

impl NcbiTaxdumpClient {
    pub fn new() -> Result<Self, ProteomeError> {
        Self::with_url(TAXDUMP_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, ProteomeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fetch-proteome/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ProteomeError::TaxonomyHttp(err.to_string()))?,
        );

        // The dump is ~60 MB; the timeout covers the whole body.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|err| ProteomeError::TaxonomyHttp(err.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    fn send_with_retries(&self) -> Result<reqwest::blocking::Response, ProteomeError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            match self.client.get(&self.url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::debug!(status, attempt, "retrying taxonomy download");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::debug!(error = %err, attempt, "retrying taxonomy download");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(ProteomeError::TaxonomyHttp(err.to_string()));
                }
            }
        }
    }
}

impl TaxonomyClient for NcbiTaxdumpClient {
    fn source(&self) -> &str {
        &self.url
    }

    fn download_dump(&self, destination: &Path) -> Result<(), ProteomeError> {
        let mut response = self.send_with_retries()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "taxonomy request failed".to_string());
            return Err(ProteomeError::TaxonomyStatus { status, message });
        }
        let mut file = File::create(destination)
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| ProteomeError::TaxonomyHttp(err.to_string()))?;
        Ok(())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn client_reports_its_source() {
        let client = NcbiTaxdumpClient::with_url("https://example.org/taxdmp.zip").unwrap();
        assert_eq!(client.source(), "https://example.org/taxdmp.zip");
    }
}
