// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads a delimited table into a polars DataFrame.
//
// Supported locations:
//   ./data/hour.csv                       → local file
//   gs://bucket/path/hour.csv             → fetched over HTTPS from
//                                           storage.googleapis.com
//   https://example.org/hour.csv          → fetched as-is
//
// Column typing is polars schema inference over every row:
// integer, float or string. Empty cells arrive as nulls and are
// rejected; there is no missing-value policy.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use std::{
    fs,
    io::{Cursor, Read},
    path::PathBuf,
};

use crate::data::table::require_complete;
use crate::domain::error::PipelineError;
use crate::domain::traits::TableSource;

const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Where the input table lives
#[derive(Debug, Clone, PartialEq)]
pub enum DataLocation {
    Local(PathBuf),
    Remote(String),
}

impl DataLocation {
    /// Classify a user-supplied path or URI.
    pub fn parse(location: &str) -> Result<Self> {
        if let Some(rest) = location.strip_prefix("gs://") {
            let (bucket, object) = rest
                .split_once('/')
                .filter(|(b, o)| !b.is_empty() && !o.is_empty())
                .with_context(|| format!("'{location}' is not a gs://bucket/object URI"))?;
            return Ok(Self::Remote(format!("{GCS_PUBLIC_HOST}/{bucket}/{object}")));
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Self::Remote(location.to_string()));
        }
        Ok(Self::Local(PathBuf::from(location)))
    }
}

/// Loads the bike-share table from a path or URI.
/// Implements the TableSource trait from Layer 3.
pub struct CsvLoader {
    location:     String,
    bearer_token: Option<String>,
    client:       reqwest::blocking::Client,
}

impl CsvLoader {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location:     location.into(),
            bearer_token: None,
            client:       reqwest::blocking::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = client;
        self
    }

    /// Attach a pre-issued OAuth bearer token for private buckets
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;

        let bytes = response
            .bytes()
            .with_context(|| format!("Cannot read response body from {url}"))?;
        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

impl TableSource for CsvLoader {
    fn load(&self) -> Result<DataFrame> {
        let bytes = match DataLocation::parse(&self.location)? {
            DataLocation::Local(path) => fs::read(&path)
                .with_context(|| format!("Cannot open '{}'", path.display()))?,
            DataLocation::Remote(url) => self.fetch_remote(&url)?,
        };
        let df = read_csv(bytes.as_slice())
            .with_context(|| format!("Cannot parse CSV from '{}'", self.location))?;

        tracing::info!(
            "Loaded {} rows and {} columns from '{}'",
            df.height(),
            df.width(),
            self.location
        );
        Ok(df)
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

/// Parse CSV text with a header row into a DataFrame.
pub fn read_csv<R: Read>(mut reader: R) -> Result<DataFrame> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context("reading CSV input")?;

    let non_blank_lines = bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(2)
        .count();
    match non_blank_lines {
        0 => bail!(PipelineError::EmptyInput("CSV has no header row")),
        1 => bail!(PipelineError::EmptyInput("CSV has no data rows")),
        _ => {}
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .context("parsing CSV")?;

    if df.height() == 0 {
        bail!(PipelineError::EmptyInput("CSV has no data rows"));
    }
    require_complete(&df)?;
    Ok(df)
}
