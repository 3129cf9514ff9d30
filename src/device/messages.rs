//! Wire messages of the TV's art channel
//!
//! Requests are JSON documents wrapped as a string inside an
//! `ms.channel.emit` envelope. Replies come back the same way inside
//! `d2d_service_message` events.

use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Channel endpoint for the art app
pub const ART_CHANNEL: &str = "com.samsung.art-app";

/// Outer event carrying art app replies
const D2D_SERVICE_MESSAGE: &str = "d2d_service_message";

/// Build the text frame for an art app request
///
/// `fields` must be a JSON object; `request`, `id` and `request_id` are
/// filled in.
pub fn art_request(request: &str, request_id: &str, fields: Value) -> String {
    let mut data = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    data.insert("request".into(), Value::from(request));
    data.insert("id".into(), Value::from(request_id));
    data.insert("request_id".into(), Value::from(request_id));

    json!({
        "method": "ms.channel.emit",
        "params": {
            "event": "art_app_request",
            "to": "host",
            "data": Value::Object(data).to_string(),
        }
    })
    .to_string()
}

/// Outer envelope of every text frame the TV sends
#[derive(Debug, Deserialize)]
struct ChannelMessage {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

/// A message received on the art channel
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Channel accepted the client, possibly handing out a new token
    Connect { token: Option<String> },
    /// Art app is ready to take requests
    Ready,
    /// User refused the connection on the TV
    Unauthorized,
    /// Reply or notification from the art app
    Art(ArtEvent),
    /// Any other channel event
    Other(String),
}

/// Parse a text frame from the TV
pub fn parse_incoming(text: &str) -> Result<Incoming, serde_json::Error> {
    let msg: ChannelMessage = serde_json::from_str(text)?;

    let incoming = match msg.event.as_str() {
        "ms.channel.connect" => Incoming::Connect {
            token: msg
                .data
                .as_ref()
                .and_then(|d| d.get("token"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "ms.channel.ready" => Incoming::Ready,
        "ms.channel.unauthorized" => Incoming::Unauthorized,
        D2D_SERVICE_MESSAGE => {
            // The payload is a JSON document encoded as a string
            let payload = match msg.data {
                Some(Value::String(s)) => serde_json::from_str::<Value>(&s)?,
                Some(other) => other,
                None => Value::Null,
            };
            Incoming::Art(ArtEvent::from_value(payload))
        }
        other => Incoming::Other(other.to_string()),
    };

    Ok(incoming)
}

/// Reply or notification from the art app
#[derive(Debug, Clone, PartialEq)]
pub struct ArtEvent {
    /// Inner event name (e.g., "image_added", "error")
    pub event: String,
    /// Full inner payload
    pub data: Map<String, Value>,
}

impl ArtEvent {
    fn from_value(value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let event = data
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self { event, data }
    }

    /// Request id this event answers, if any
    pub fn request_id(&self) -> Option<&str> {
        self.str_field("request_id").or_else(|| self.str_field("id"))
    }

    /// String field of the payload
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Whether the art app reported a failure
    pub fn is_error(&self) -> bool {
        self.event == "error"
    }

    /// Human readable failure detail of an `error` event
    pub fn error_message(&self) -> String {
        match self.data.get("error_code") {
            Some(Value::String(code)) => format!("error code {}", code),
            Some(Value::Number(code)) => format!("error code {}", code),
            _ => "unknown error".to_string(),
        }
    }

    /// New art mode state carried by this event, if it is a status event
    pub fn art_mode(&self) -> Option<bool> {
        match self.event.as_str() {
            "art_mode_changed" => self.str_field("status").map(|s| s == "on"),
            "artmode_status" => self.str_field("value").map(|s| s == "on"),
            "go_to_standby" => Some(false),
            _ => None,
        }
    }
}

/// Where to stream the image bytes, from a `ready_to_use` event
#[derive(Debug, Clone, PartialEq)]
pub struct ConnInfo {
    pub ip: String,
    pub port: u16,
    pub key: String,
    pub secured: bool,
}

impl ConnInfo {
    /// Extract the connection details of a `ready_to_use` event
    pub fn from_event(event: &ArtEvent) -> Option<Self> {
        // Firmware sends conn_info as a JSON string, older ones as an object
        let info = match event.data.get("conn_info")? {
            Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
            other => other.clone(),
        };

        let port = match info.get("port")? {
            Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };

        let secured = match info.get("secured") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        };

        Some(Self {
            ip: info.get("ip")?.as_str()?.to_string(),
            port,
            key: info.get("key")?.as_str()?.to_string(),
            secured,
        })
    }
}

/// Upload file type tag as the art app expects it
pub fn normalize_file_type(file_type: &str) -> String {
    let lower = file_type.to_lowercase();
    if lower == "jpeg" {
        "jpg".to_string()
    } else {
        lower
    }
}

/// Frame preceding the image bytes on the upload socket
///
/// A 4-byte big-endian length followed by the JSON header.
pub fn upload_header(file_length: usize, file_type: &str, sec_key: &str) -> Vec<u8> {
    let header = json!({
        "num": 0,
        "total": 1,
        "fileLength": file_length,
        "fileName": "dummy",
        "fileType": file_type,
        "secKey": sec_key,
        "version": "0.0.1",
    })
    .to_string();

    let mut frame = Vec::with_capacity(4 + header.len());
    frame.extend_from_slice(&(header.len() as u32).to_be_bytes());
    frame.extend_from_slice(header.as_bytes());
    frame
}
