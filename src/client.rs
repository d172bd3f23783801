use crate::metrics::Metrics;
use crate::network::{Record, Status};
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Default address of a locally running server.
pub const DEFAULT_URL: &str = "http://localhost:4000";

/// Blocking HTTP client of a kvd server.
///
/// Every call issues exactly one request. Replies outside the 2xx range are
/// returned as `ClientError::Status` carrying the server's message; nothing
/// is retried.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: Url,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://localhost:4000`.
    pub fn new(base_url: &str) -> Result<Client> {
        let invalid = || ClientError::InvalidUrl {
            url: base_url.to_owned(),
        };

        let base_url = Url::parse(base_url).map_err(|_| invalid())?;
        if base_url.cannot_be_a_base() {
            return Err(invalid());
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|c| ClientError::Transport { c })?;

        Ok(Client { base_url, http })
    }

    /// Returns the value of the given key.
    pub fn get(&self, key: &str) -> Result<String> {
        check_key(key)?;

        let resp = self.send(self.http.get(self.key_url(key)))?;
        resp.text().map_err(|c| ClientError::Transport { c })
    }

    /// Sets the value of the given key.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;

        self.send(self.http.put(self.key_url(key)).body(value.to_owned()))?;
        Ok(())
    }

    /// Removes the given key, returning the value it held.
    pub fn delete(&self, key: &str) -> Result<String> {
        check_key(key)?;

        let resp = self.send(self.http.delete(self.key_url(key)))?;
        resp.text().map_err(|c| ClientError::Transport { c })
    }

    /// Returns the records of all given keys, in the requested order.
    pub fn bulk_get(&self, keys: &[String]) -> Result<Vec<Record>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let resp = self.send(self.http.get(self.bulk_url()).json(keys))?;
        resp.json().map_err(|c| ClientError::Transport { c })
    }

    /// Sets all given records in one atomic batch.
    pub fn bulk_set(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.send(self.http.put(self.bulk_url()).json(records))?;
        Ok(())
    }

    /// Removes all given keys in one atomic batch.
    pub fn bulk_delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        self.send(self.http.delete(self.bulk_url()).json(keys))?;
        Ok(())
    }

    /// Returns the server's usage metrics.
    pub fn metrics(&self) -> Result<Metrics> {
        let resp = self.send(self.http.get(self.url(&["metrics"])))?;
        resp.json().map_err(|c| ClientError::Transport { c })
    }

    /// Returns the server's status report.
    pub fn status(&self) -> Result<Status> {
        let resp = self.send(self.http.get(self.url(&["status"])))?;
        resp.json().map_err(|c| ClientError::Transport { c })
    }

    /// Append `segments` to the base URL, percent-encoding each one so a key
    /// containing `/`, `?` or `#` stays a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn key_url(&self, key: &str) -> Url {
        self.url(&["v1", key])
    }

    fn bulk_url(&self) -> Url {
        // The empty last segment yields the trailing slash of `/v1/`.
        self.url(&["v1", ""])
    }

    fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().map_err(|c| ClientError::Transport { c })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body: body.trim_end().to_owned(),
        })
    }
}

/// Parse a `KEY=VALUE` command line argument. The value may itself contain
/// `=`; the key may not be empty.
pub fn parse_pair(arg: &str) -> Result<Record> {
    let mut parts = arg.splitn(2, '=');

    match (parts.next(), parts.next()) {
        (Some(key), Some(value)) if !key.is_empty() => Ok(Record::new(key, value)),
        _ => Err(ClientError::MalformedPair {
            arg: arg.to_owned(),
        }),
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ClientError::EmptyKey);
    }
    Ok(())
}

/// Result type returned by `Client`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for the kvd client.
#[derive(Debug, Fail)]
pub enum ClientError {
    /// The caller supplied an empty key.
    #[fail(display = "key cannot be empty")]
    EmptyKey,

    /// The server URL could not be parsed.
    #[fail(display = "invalid server URL '{}'", url)]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// A command line argument was not of the form `KEY=VALUE`.
    #[fail(display = "expected KEY=VALUE, got '{}'", arg)]
    MalformedPair {
        /// The offending argument.
        arg: String,
    },

    /// Failure talking to the server or decoding its reply.
    #[fail(display = "request failed: {}", c)]
    Transport {
        /// Underlying reqwest Error.
        #[cause]
        c: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[fail(display = "server returned error: {} (status: {})", body, status)]
    Status {
        /// HTTP status code of the reply.
        status: u16,
        /// Body of the reply.
        body: String,
    },
}

impl ClientError {
    /// Whether the server reported the key as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::Status { status, .. } => *status == StatusCode::NOT_FOUND.as_u16(),
            _ => false,
        }
    }
}
