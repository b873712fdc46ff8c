//! LWS API v1 wire format
//!
//! Every response is an envelope:
//!
//! ```json
//! { "code": 200, "info": "Fetched data successfully", "data": [ ... ] }
//! ```
//!
//! `code` 200 is success. `info` is either a message string or an object
//! whose first string value is the message.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use zonesync_core::{DnsRecord, RecordId};

/// Envelope code of a successful answer
pub const CODE_OK: i64 = 200;

/// Envelope code also accepted for deletes
pub const CODE_DELETED: i64 = 201;

/// Longest body excerpt written to logs or errors
const LOG_EXCERPT_CHARS: usize = 512;

/// Response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Outcome code
    pub code: i64,
    /// Message, string or object
    #[serde(default)]
    pub info: Value,
    /// Payload
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Human-readable message carried by `info`
    pub fn message(&self) -> String {
        match &self.info {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .values()
                .find_map(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| self.fallback_message()),
            _ => self.fallback_message(),
        }
    }

    /// Whether the envelope reports success
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    fn fallback_message(&self) -> String {
        format!("API error (code {})", self.code)
    }
}

/// A record as the API lists or echoes it
///
/// Every field is optional: echoes are often partial.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_ttl")]
    pub ttl: Option<u32>,
}

impl WireRecord {
    /// Fill the gaps of this echo from `sent`
    ///
    /// A missing identifier keeps the one that was sent. An explicit one is
    /// kept as-is, valid or not.
    pub fn merge_over(self, sent: &DnsRecord) -> DnsRecord {
        DnsRecord {
            id: self.id.unwrap_or(sent.id),
            name: self.name.unwrap_or_else(|| sent.name.clone()),
            record_type: self.record_type.unwrap_or_else(|| sent.record_type.clone()),
            value: self.value.unwrap_or_else(|| sent.value.clone()),
            ttl: self.ttl.unwrap_or(sent.ttl),
            zone: sent.zone.clone(),
        }
    }

    /// Convert a listed record, `zone` being the zone that was listed
    pub fn into_record(self, zone: &str) -> DnsRecord {
        DnsRecord {
            id: self.id.unwrap_or(RecordId::UNASSIGNED),
            name: self.name.unwrap_or_default(),
            record_type: self.record_type.unwrap_or_default(),
            value: self.value.unwrap_or_default(),
            ttl: self.ttl.unwrap_or_default(),
            zone: zone.to_string(),
        }
    }
}

/// Decode the `data` of a zone listing
///
/// `null` is an empty zone.
pub fn parse_records(data: Value) -> Result<Vec<WireRecord>, serde_json::Error> {
    if data.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(data)
}

/// Decode the `data` of a create or update echo, if it is a record at all
pub fn parse_echo(data: Value) -> Option<WireRecord> {
    match data {
        Value::Object(_) => serde_json::from_value(data).ok(),
        _ => None,
    }
}

/// Body of a create request
#[derive(Debug, Serialize)]
pub struct CreateBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub value: &'a str,
    pub ttl: u32,
}

/// Body of an update request
#[derive(Debug, Serialize)]
pub struct UpdateBody<'a> {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub value: &'a str,
    pub ttl: u32,
}

/// Body of a delete request
#[derive(Debug, Serialize)]
pub struct DeleteBody {
    pub id: RecordId,
}

// Identifiers arrive as numbers, numeric strings, or garbage
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(RecordId::new(number_id(&n))),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(RecordId::parse_lenient(&s)),
        Some(_) => Some(RecordId::UNASSIGNED),
    })
}

// `12` and `12.0` are the same identifier; `12.5` is none
fn number_id(n: &serde_json::Number) -> i64 {
    if let Some(id) = n.as_i64() {
        return id;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f > 0.0 && f <= i64::MAX as f64 => f as i64,
        _ => 0,
    }
}

fn lenient_ttl<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Markers of an HTML challenge page served instead of the API
const CHALLENGE_MARKERS: &[&str] = &[
    "<!DOCTYPE html",
    "<html",
    "Just a moment...",
    "cloudflare",
    "challenge",
];

/// Whether `body` is a challenge page from the provider's upstream
/// protection layer
pub fn is_challenge_page(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Message for a challenge page
pub fn challenge_message(status: u16, body: &str) -> String {
    if body.contains("Invalid response from upstream server") {
        format!(
            "LWS API answered HTTP {} with a challenge page: the upstream server is failing. \
             The provider is blocking requests or down; try again in a few minutes.",
            status
        )
    } else {
        format!(
            "LWS API answered HTTP {} with an HTML challenge page instead of JSON. \
             The provider is blocking requests or down; try again in a few minutes.",
            status
        )
    }
}

/// Shorten a body for logs and error messages
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn message_from_string_info() {
        let env = envelope(json!({"code": 400, "info": "Invalid zone", "data": null}));
        assert_eq!(env.message(), "Invalid zone");
        assert!(!env.is_success());
    }

    #[test]
    fn message_from_object_info() {
        let env = envelope(json!({"code": 400, "info": {"name": "Cannot add record"}}));
        assert_eq!(env.message(), "Cannot add record");
    }

    #[test]
    fn message_fallback() {
        let env = envelope(json!({"code": 503, "info": {"n": 1}}));
        assert_eq!(env.message(), "API error (code 503)");
        assert_eq!(envelope(json!({"code": 418})).message(), "API error (code 418)");
    }

    #[test]
    fn records_with_mixed_id_encodings() {
        let records = parse_records(json!([
            {"id": 12, "name": "www", "type": "A", "value": "1.2.3.4", "ttl": 3600},
            {"id": "13", "name": "api", "type": "CNAME", "value": "www", "ttl": "300"},
            {"name": "mail", "type": "MX", "value": "10 mx.example.com"}
        ]))
        .unwrap();

        let converted: Vec<DnsRecord> = records.into_iter().map(|r| r.into_record("example.com")).collect();
        assert_eq!(converted[0].id, RecordId::new(12));
        assert_eq!(converted[1].id, RecordId::new(13));
        assert_eq!(converted[1].ttl, 300);
        assert_eq!(converted[2].id, RecordId::UNASSIGNED);
        assert!(converted.iter().all(|r| r.zone == "example.com"));
    }

    #[test]
    fn float_encoded_ids() {
        let records = parse_records(json!([
            {"id": 12.0, "name": "www", "type": "A", "value": "1.2.3.4"},
            {"id": 12.5, "name": "api", "type": "A", "value": "1.2.3.5"},
            {"id": -3.0, "name": "mail", "type": "A", "value": "1.2.3.6"}
        ]))
        .unwrap();

        assert_eq!(records[0].id, Some(RecordId::new(12)));
        assert_eq!(records[1].id, Some(RecordId::UNASSIGNED));
        assert_eq!(records[2].id, Some(RecordId::UNASSIGNED));
    }

    #[test]
    fn null_data_is_empty_zone() {
        assert!(parse_records(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn merge_keeps_sent_id_when_missing() {
        let sent = DnsRecord {
            id: RecordId::new(42),
            name: "www".to_string(),
            record_type: "A".to_string(),
            value: "1.2.3.4".to_string(),
            ttl: 3600,
            zone: "example.com".to_string(),
        };

        let echo = parse_echo(json!({"value": "5.6.7.8"})).unwrap();
        let merged = echo.merge_over(&sent);
        assert_eq!(merged.id, RecordId::new(42));
        assert_eq!(merged.value, "5.6.7.8");
        assert_eq!(merged.zone, "example.com");

        let explicit = parse_echo(json!({"id": 0})).unwrap().merge_over(&sent);
        assert_eq!(explicit.id, RecordId::UNASSIGNED);

        assert!(parse_echo(json!([])).is_none());
        assert!(parse_echo(Value::Null).is_none());
    }

    #[test]
    fn bodies_serialize_with_type_key() {
        let body = serde_json::to_value(UpdateBody {
            id: RecordId::new(7),
            record_type: "A",
            name: "www",
            value: "1.2.3.4",
            ttl: 300,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"id": 7, "type": "A", "name": "www", "value": "1.2.3.4", "ttl": 300})
        );
        assert_eq!(
            serde_json::to_value(DeleteBody { id: RecordId::new(7) }).unwrap(),
            json!({"id": 7})
        );
    }

    #[test]
    fn challenge_detection() {
        assert!(is_challenge_page("<!DOCTYPE html><title>Just a moment...</title>"));
        assert!(is_challenge_page("<html><body>blocked</body></html>"));
        assert!(!is_challenge_page("Internal Server Error"));
        assert!(challenge_message(503, "Invalid response from upstream server").contains("upstream"));
        assert!(challenge_message(403, "<html>").contains("try again"));
    }

    #[test]
    fn excerpt_is_char_safe() {
        let long = "é".repeat(600);
        let short = excerpt(&long);
        assert!(short.starts_with("éé"));
        assert!(short.ends_with("bytes)"));
        assert_eq!(excerpt("ok"), "ok");
    }
}
