use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::load_config;
use crate::error::{Error, Result};
use crate::query::{AreaType, Query};

/// Ceiling on the match count for [`Client::get_observations`].
const OBSERVATION_LIMIT: u64 = 10_000;
/// Page size for the search endpoint.
const OBSERVATION_TAKE: u64 = 1_000;
/// Ceiling on the match count for [`Client::download_csv`].
const DOWNLOAD_LIMIT: u64 = 25_000;

/// Field paths requested for every observation returned by
/// [`Client::get_observations`].
pub const DEFAULT_OUTPUT_FIELDS: [&str; 18] = [
    "datasetName",
    "location.province",
    "location.county",
    "location.municipality",
    "location.locality",
    "location.locationId",
    "location.coordinateUncertaintyInMeters",
    "taxon.vernacularName",
    "taxon.scientificName",
    "occurrence.occurrenceId",
    "occurrence.reportedBy",
    "occurrence.individualCount",
    "occurrence.sex",
    "occurrence.lifeStage",
    "occurrence.activity",
    "occurrence.occurrenceRemarks",
    "event.startDate",
    "event.endDate",
];

/// A single observation record, passed through from the service unmodified.
pub type Observation = serde_json::Map<String, Value>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base SOS API URL, typically
    /// `https://api.artdatabanken.se/species-observation-system/v1`.
    pub url: String,
    /// Subscription key for the API.
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Blocking client for the SOS observation endpoints.
///
/// Every request carries the API version marker and the subscription key as
/// default headers. The client holds no other state; each operation is a
/// single request/response sequence (or a bounded loop of identical page
/// requests) with no retries.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,

    timeout: Duration,
    progress: bool,

    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct AreaPage {
    records: Vec<AreaRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AreaRecord {
    feature_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    records: Vec<Observation>,
}

impl Client {
    /// Creates a client using environment variables and/or `.sosapirc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `SOS_API_URL` / `SOS_API_KEY`
    /// - config file from `SOS_API_RC` or `.sosapirc`
    pub fn new(url: Option<String>, key: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, key, verify)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert("X-Api-Version", HeaderValue::from_static("1.5"));
        default_headers.insert(
            "Ocp-Apim-Subscription-Key",
            HeaderValue::from_str(&cfg.key).map_err(|_| {
                Error::Config("API key contains characters not allowed in a header".into())
            })?,
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;

        Ok(Self {
            url: cfg.url,
            timeout: Duration::from_secs(60),
            progress: true,
            http,
        })
    }

    /// Per-request timeout, covering the full response body. Default 60s.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the progress bar shown while writing an export.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Resolves a human-readable area name to its feature id.
    ///
    /// Returns the feature id of the first matching record;
    /// [`Error::AreaNotFound`] if nothing matched.
    pub fn get_area_id(&self, area_type: AreaType, area_name: &str) -> Result<String> {
        let resp = self
            .http
            .get(self.endpoint("Areas"))
            .timeout(self.timeout)
            .query(&[
                ("areaTypes", area_type.as_str()),
                ("searchString", area_name),
                ("skip", "0"),
                ("take", "1"),
            ])
            .send()?
            .error_for_status()?;

        let page: AreaPage = resp.json()?;
        let record = page
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::AreaNotFound {
                search: area_name.to_string(),
            })?;
        Ok(record.feature_id)
    }

    /// Number of observations matching the query.
    pub fn get_count(&self, query: &Query) -> Result<u64> {
        let resp = self
            .http
            .post(self.endpoint("Observations/Count"))
            .timeout(self.timeout)
            .json(query)
            .send()?
            .error_for_status()?;

        // The count endpoint responds with a bare decimal integer.
        let body = resp.text()?;
        let count = body.trim().parse::<u64>();
        count.map_err(|_| Error::InvalidCount { body })
    }

    /// Fetches every observation matching the query, fully materialized.
    ///
    /// Fails with [`Error::EmptyResult`] when nothing matched and
    /// [`Error::TooManyResults`] above 10 000 matches. The query's output
    /// fields are overwritten with [`DEFAULT_OUTPUT_FIELDS`] before the
    /// first page request; that mutation is visible to the caller.
    pub fn get_observations(&self, query: &mut Query) -> Result<Vec<Observation>> {
        let count = self.get_count(query)?;
        if count == 0 {
            return Err(Error::EmptyResult);
        }
        if count > OBSERVATION_LIMIT {
            return Err(Error::TooManyResults {
                count,
                limit: OBSERVATION_LIMIT,
            });
        }

        query.set_output_fields(DEFAULT_OUTPUT_FIELDS);

        let mut records: Vec<Observation> = Vec::with_capacity(count as usize);
        let mut skip = 0u64;

        // The last page may ask past `count`; the service returns only the
        // remaining records, so no local truncation is done.
        while skip < count {
            let resp = self
                .http
                .post(self.endpoint("Observations/Search"))
                .timeout(self.timeout)
                .query(&[("skip", skip), ("take", OBSERVATION_TAKE)])
                .json(&*query)
                .send()?
                .error_for_status()?;

            let page: SearchPage = resp.json()?;
            records.extend(page.records);
            skip += OBSERVATION_TAKE;
        }

        Ok(records)
    }

    /// Exports matching observations to a CSV file at `target`.
    ///
    /// The response bytes are written verbatim (gzip-compressed when
    /// `compress` is set), creating or truncating the file. When
    /// `output_fields` is given it overwrites the query's output fields —
    /// including with an empty list when the supplied slice is empty; pass
    /// `None` to leave the query's existing output configuration untouched.
    /// Fails with [`Error::EmptyResult`] when nothing matched and
    /// [`Error::TooManyResults`] above 25 000 matches.
    pub fn download_csv(
        &self,
        query: &mut Query,
        target: &Path,
        compress: bool,
        output_fields: Option<&[&str]>,
    ) -> Result<()> {
        let count = self.get_count(query)?;
        if count == 0 {
            return Err(Error::EmptyResult);
        }
        if count > DOWNLOAD_LIMIT {
            return Err(Error::TooManyResults {
                count,
                limit: DOWNLOAD_LIMIT,
            });
        }

        if let Some(fields) = output_fields {
            query.set_output_fields(fields.iter().copied());
        }

        let mut resp = self
            .http
            .post(self.endpoint("Exports/Download/Csv"))
            .timeout(self.timeout)
            .query(&[("gzip", compress)])
            .json(&*query)
            .send()?
            .error_for_status()?;

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pb = match (self.progress, resp.content_length()) {
            (false, _) => None,
            (true, Some(len)) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                    )
                    .unwrap()
                    .progress_chars("=>-"),
                );
                Some(pb)
            }
            (true, None) => Some(ProgressBar::new_spinner()),
        };

        let mut out = File::create(target)?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = resp.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }
        out.flush()?;

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }
}
