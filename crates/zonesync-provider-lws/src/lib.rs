// # LWS Remote Directory
//
// This crate provides the LWS DNS API client for zonesync.
//
// ## Behavior
//
// - One async mutex per client: calls through one client never overlap,
//   retries included. Separate clients run in parallel.
// - Bounded retry with exponential backoff on transport failures, HTTP 5xx,
//   408 and 429, and bodies that are not an API answer.
// - No retry on a well-formed error envelope. Its text is classified into
//   conflict / not-found / other at this boundary. A 4xx carrying an
//   envelope is the API's considered answer (validation, duplicate, unknown
//   ID); repeating the request cannot change it, and repeating a delete
//   would turn "already absent" into noise.
// - The create echo carries no usable identifier, so a create is followed by
//   a zone listing to discover it.
//
// ## Security Requirements
//
// - API key NEVER appears in logs, Debug output or error messages
//
// ## API Reference
//
// - Base URL: https://api.lws.net/v1
// - List records:  GET    `/domain/:zone/zdns`
// - Create record: POST   `/domain/:zone/zdns` `{type, name, value, ttl}`
// - Update record: PUT    `/domain/:zone/zdns` `{id, type, name, value, ttl}`
// - Delete record: DELETE `/domain/:zone/zdns` `{id}`

pub mod retry;
pub mod wire;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use zonesync_core::classify::{ErrorClass, Operation, classify_for};
use zonesync_core::config::{ClientConfig, ProviderConfig};
use zonesync_core::traits::{DeleteOutcome, LookupOutcome, RemoteDirectory, RemoteDirectoryFactory};
use zonesync_core::{DesiredRecord, DnsRecord, DnsZone, Error, RecordId, Result, ZoneView};

pub use retry::RetryPolicy;
use wire::{CODE_DELETED, CreateBody, DeleteBody, Envelope, UpdateBody};

/// LWS API base URL
pub const LWS_API_BASE: &str = "https://api.lws.net/v1";

/// Provider name used in logs and the registry
pub const PROVIDER_NAME: &str = "lws";

/// A structured answer: the API spoke, whatever it said
#[derive(Debug)]
struct Answer {
    status: u16,
    envelope: Envelope,
}

impl Answer {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.envelope.is_success()
    }

    fn message(&self) -> String {
        self.envelope.message()
    }
}

/// LWS DNS API client
///
/// Owns its HTTP session and retry policy. All calls through one instance
/// are serialized.
pub struct LwsClient {
    login: String,
    /// NEVER log this value
    api_key: String,
    base_url: String,
    test_mode: bool,
    http: reqwest::Client,
    retry: RetryPolicy,
    gate: Mutex<()>,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for LwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LwsClient")
            .field("login", &self.login)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("test_mode", &self.test_mode)
            .field("retry", &self.retry)
            .finish()
    }
}

impl LwsClient {
    /// Create a client
    ///
    /// `base_url` defaults to [`LWS_API_BASE`]. A trailing slash is ignored.
    pub fn new(
        login: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
        test_mode: bool,
        config: &ClientConfig,
    ) -> Result<Self> {
        config.validate()?;

        let login = login.into();
        let api_key = api_key.into();
        if login.trim().is_empty() {
            return Err(Error::config("LWS login cannot be empty"));
        }
        if api_key.trim().is_empty() {
            return Err(Error::config("LWS API key cannot be empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| LWS_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        if test_mode {
            warn!("LWS client running in TEST mode - the API validates but does not apply changes");
        }

        Ok(Self {
            login,
            api_key,
            base_url,
            test_mode,
            http,
            retry: RetryPolicy::from(config),
            gate: Mutex::new(()),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn zone_url(&self, zone: &str) -> String {
        format!("{}/domain/{}/zdns", self.base_url, zone.trim())
    }

    /// Run one call with retries, holding the client's gate throughout
    async fn call<B: Serialize + Sync>(
        &self,
        method: Method,
        zone: &str,
        body: Option<&B>,
    ) -> Result<Answer> {
        let _guard = self.gate.lock().await;

        let url = self.zone_url(zone);
        let body = body.map(serde_json::to_value).transpose()?;
        let max_attempts = self.retry.max_attempts();
        let mut delays = self.retry.backoff();
        let mut attempt = 1;

        loop {
            debug!(
                "LWS API Request: {} {} (attempt {}/{}), X-Auth-Login={}, X-Auth-Pass=<REDACTED>, X-Test-Mode={}",
                method, url, attempt, max_attempts, self.login, self.test_mode
            );
            if let Some(body) = &body {
                debug!("Request Body: {}", body);
            }

            let err = match self.attempt(&method, &url, body.as_ref()).await {
                Ok(answer) => return Ok(answer),
                Err(e) => e,
            };

            match delays.next() {
                Some(delay) if err.is_retryable() => {
                    warn!(
                        "LWS {} {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                        method,
                        url,
                        attempt,
                        max_attempts,
                        delay.as_secs_f32(),
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => {
                    if err.is_retryable() {
                        error!("LWS {} {} failed after {} attempt(s): {}", method, url, attempt, err);
                    }
                    return Err(match err {
                        Error::Transient { message, .. } => Error::Transient {
                            attempts: attempt,
                            message,
                        },
                        other => other,
                    });
                }
            }
        }
    }

    /// One HTTP exchange
    ///
    /// `Ok` means the API answered with an envelope, success or not.
    /// Everything else is an error, retryable when another attempt could
    /// change it.
    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Answer> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("X-Auth-Login", &self.login)
            .header("X-Auth-Pass", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if self.test_mode {
            request = request.header("X-Test-Mode", "true");
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| Error::Transient {
            attempts: 1,
            message: format!("HTTP request to {} failed: {}", url, e.without_url()),
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| Error::Transient {
            attempts: 1,
            message: format!("Failed to read response body from {}: {}", url, e.without_url()),
        })?;

        debug!("LWS API Response: HTTP {} {}", status, wire::excerpt(&text));

        if text.trim().is_empty() {
            return Err(Error::unparseable(
                status,
                format!(
                    "empty response from {}; the endpoint may not exist or authentication failed",
                    url
                ),
            ));
        }

        let envelope = match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                if wire::is_challenge_page(&text) {
                    return Err(Error::unparseable(status, wire::challenge_message(status, &text)));
                }
                return Err(Error::unparseable(
                    status,
                    format!("invalid JSON from {}: {} (body: {})", url, e, wire::excerpt(&text)),
                ));
            }
        };

        if matches!(status, 408 | 429 | 500..=599) {
            return Err(Error::Transient {
                attempts: 1,
                message: format!(
                    "HTTP {} from {}: code {}, {}",
                    status,
                    url,
                    envelope.code,
                    envelope.message()
                ),
            });
        }

        Ok(Answer { status, envelope })
    }

    /// Map an unsuccessful answer to `operation` to an error
    fn rejection(&self, operation: Operation, answer: &Answer) -> Error {
        let message = answer.message();
        if matches!(answer.status, 401 | 403) {
            return Error::auth(format!(
                "LWS rejected the credentials for {} (HTTP {}): {}",
                self.login, answer.status, message
            ));
        }
        match classify_for(operation, &message) {
            ErrorClass::NotFound => Error::not_found(message),
            ErrorClass::Conflict => Error::conflict(message),
            ErrorClass::Other => Error::api(answer.envelope.code, message),
        }
    }

    /// List a zone, failing on anything but a success answer
    async fn list(&self, zone: &str) -> Result<DnsZone> {
        let answer = self.call::<()>(Method::GET, zone, None).await?;
        if !answer.is_success() {
            return Err(self.rejection(Operation::Fetch, &answer));
        }

        let records = wire::parse_records(answer.envelope.data).map_err(|e| {
            Error::unparseable(answer.status, format!("zone {} records are malformed: {}", zone, e))
        })?;

        Ok(DnsZone {
            name: zone.to_string(),
            records: records.into_iter().map(|r| r.into_record(zone)).collect(),
        })
    }

    /// Find the identifier of a record that was just created
    async fn discover_id(&self, desired: &DesiredRecord) -> Result<RecordId> {
        debug!(
            "Create echo for {} ({}) carried no ID, listing zone {}",
            desired.name, desired.record_type, desired.zone
        );

        let zone = self.list(&desired.zone).await.map_err(|e| {
            Error::contract_violation(format!(
                "record was created but its ID could not be retrieved: {}",
                e
            ))
        })?;

        ZoneView::new(&desired.zone, zone)
            .find_by_identity(desired)
            .map(|r| r.id)
            .filter(|id| id.is_valid())
            .ok_or_else(|| {
                Error::contract_violation(format!(
                    "record {} ({}) was created but its ID could not be found in zone {}",
                    desired.name, desired.record_type, desired.zone
                ))
            })
    }
}

#[async_trait]
impl RemoteDirectory for LwsClient {
    async fn fetch_zone(&self, zone: &str) -> LookupOutcome<DnsZone> {
        let zone_data = self.list(zone).await;
        if let Ok(z) = &zone_data {
            debug!("Zone {} lists {} records", zone, z.records.len());
        }
        zone_data.into()
    }

    async fn create_record(&self, desired: &DesiredRecord) -> Result<DnsRecord> {
        let body = CreateBody {
            record_type: &desired.record_type,
            name: &desired.name,
            value: &desired.value,
            ttl: desired.effective_ttl(),
        };

        info!(
            "Creating LWS record {} ({}) -> {} in zone {} [ttl: {}]",
            desired.name,
            desired.record_type,
            desired.value,
            desired.zone,
            body.ttl
        );

        let answer = self.call(Method::POST, &desired.zone, Some(&body)).await?;
        if !answer.is_success() {
            let e = self.rejection(Operation::Create, &answer);
            error!("LWS create of {} ({}) rejected: {}", desired.name, desired.record_type, e);
            return Err(e);
        }

        let sent = desired.to_record(RecordId::UNASSIGNED);
        let mut created = match wire::parse_echo(answer.envelope.data) {
            Some(echo) => echo.merge_over(&sent),
            None => sent,
        };

        if !created.id.is_valid() {
            created.id = self.discover_id(desired).await?;
        }

        debug!("Created record has ID {}", created.id);
        Ok(created.in_zone(&desired.zone))
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        let body = UpdateBody {
            id: record.id,
            record_type: &record.record_type,
            name: &record.name,
            value: &record.value,
            ttl: record.ttl,
        };

        info!(
            "Updating LWS record {} ({}) ID {} -> {} in zone {}",
            record.name, record.record_type, record.id, record.value, record.zone
        );

        let answer = self.call(Method::PUT, &record.zone, Some(&body)).await?;
        if !answer.is_success() {
            return Err(self.rejection(Operation::Update, &answer));
        }

        let updated = match wire::parse_echo(answer.envelope.data) {
            Some(echo) => echo.merge_over(record),
            None => record.clone(),
        };
        Ok(updated.in_zone(&record.zone))
    }

    async fn delete_record(&self, zone: &str, id: RecordId) -> Result<DeleteOutcome> {
        info!("Deleting LWS record ID {} from zone {}", id, zone);

        let answer = self.call(Method::DELETE, zone, Some(&DeleteBody { id })).await?;
        let accepted = answer.is_success()
            || ((200..300).contains(&answer.status) && answer.envelope.code == CODE_DELETED);
        if accepted {
            return Ok(DeleteOutcome::Deleted);
        }

        match self.rejection(Operation::Delete, &answer) {
            Error::NotFound(detail) => {
                debug!("Record ID {} already absent from zone {}: {}", id, zone, detail);
                Ok(DeleteOutcome::AlreadyAbsent(detail))
            }
            e if answer.status == 404 => {
                debug!("Record ID {} already absent from zone {} (HTTP 404): {}", id, zone, e);
                Ok(DeleteOutcome::AlreadyAbsent(e.to_string()))
            }
            e => Err(e),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating LWS clients
pub struct LwsFactory;

impl RemoteDirectoryFactory for LwsFactory {
    fn create(
        &self,
        provider: &ProviderConfig,
        client: &ClientConfig,
    ) -> Result<Box<dyn RemoteDirectory>> {
        match provider {
            ProviderConfig::Lws {
                login,
                api_key,
                base_url,
                test_mode,
            } => Ok(Box::new(LwsClient::new(
                login.clone(),
                api_key.clone(),
                base_url.clone(),
                *test_mode,
                client,
            )?)),
            _ => Err(Error::config("Invalid config for LWS provider")),
        }
    }
}

/// Register the LWS client with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::DirectoryRegistry;
///
/// let registry = DirectoryRegistry::new();
/// zonesync_provider_lws::register(&registry);
/// assert!(registry.has_directory("lws"));
/// ```
pub fn register(registry: &zonesync_core::DirectoryRegistry) {
    registry.register_directory(PROVIDER_NAME, Box::new(LwsFactory));
}
