//! Art channel session with a Samsung Frame TV
//!
//! A session owns one WebSocket connection to the TV's art app and two
//! background tasks:
//! - the write pump, which serializes outgoing frames
//! - the read pump, which routes replies to waiting requests and keeps the
//!   passive art mode flag up to date
//!
//! Requests are correlated with replies by their request id, or by the name
//! of the event the TV answers with.

use crate::core::config::TvConfig;
use crate::device::messages::{
    art_request, normalize_file_type, parse_incoming, ArtEvent, ConnInfo, Incoming, ART_CHANNEL,
};
use crate::device::rest::RestClient;
use crate::device::tls::insecure_client_config;
use crate::device::transfer::send_image_blocking;
use crate::device::traits::{ArtSession, ArtworkInfo, DeviceError};
use async_trait::async_trait;
use base64::Engine;
use futures_util::{SinkExt, Stream, StreamExt};
use log::{debug, info, trace, warn};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::Connector;

/// How long the TV may take to accept a new client (it may show a prompt)
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for `ms.channel.ready` once connected
const READY_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for an acknowledgement of fire-and-forget requests
const ACK_GRACE: Duration = Duration::from_secs(3);

/// Options for opening a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub client_name: String,
    pub token_file: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl SessionOptions {
    /// Build options from the `[tv]` config section
    pub fn from_config(config: &TvConfig) -> Result<Self, DeviceError> {
        let host = config
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| DeviceError::Connection("no TV address configured".to_string()))?;

        Ok(Self {
            host,
            port: config.port,
            client_name: config.client_name.clone(),
            token_file: config.token_file.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    /// Pairing token saved by an earlier run
    fn saved_token(&self) -> Option<String> {
        let path = self.token_file.as_ref()?;
        let token = fs::read_to_string(path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save_token(&self, token: &str) {
        let Some(path) = &self.token_file else {
            return;
        };
        match fs::write(path, token) {
            Ok(()) => info!("Saved TV token to {}", path.display()),
            Err(e) => warn!("Failed to save TV token to {}: {}", path.display(), e),
        }
    }
}

/// WebSocket URL of the art channel
pub fn channel_url(host: &str, port: u16, client_name: &str, token: Option<&str>) -> String {
    let scheme = if port == 8002 { "wss" } else { "ws" };
    let name = base64::engine::general_purpose::STANDARD.encode(client_name);
    let mut url = format!(
        "{}://{}:{}/api/v2/channels/{}?name={}",
        scheme, host, port, ART_CHANNEL, name
    );
    if let Some(token) = token {
        url.push_str("&token=");
        url.push_str(token);
    }
    url
}

// ============================================================================
// Reply routing
// ============================================================================

/// What a pending request is waiting for
#[derive(Debug, Clone, PartialEq)]
struct ReplyMatch {
    request_id: String,
    /// Wait for this event name instead of any reply carrying the id
    event: Option<String>,
}

impl ReplyMatch {
    fn matches(&self, event: &ArtEvent) -> bool {
        let same_id = event.request_id() == Some(self.request_id.as_str());
        match &self.event {
            Some(name) => event.event == *name || (same_id && event.is_error()),
            None => same_id,
        }
    }
}

/// Requests waiting for a reply from the read pump
#[derive(Default)]
pub(crate) struct PendingReplies {
    next_ticket: u64,
    waiters: Vec<(u64, ReplyMatch, oneshot::Sender<ArtEvent>)>,
}

impl PendingReplies {
    fn register(&mut self, matcher: ReplyMatch) -> (u64, oneshot::Receiver<ArtEvent>) {
        let (tx, rx) = oneshot::channel();
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiters.push((ticket, matcher, tx));
        (ticket, rx)
    }

    fn cancel(&mut self, ticket: u64) {
        self.waiters.retain(|(t, _, _)| *t != ticket);
    }

    /// Hand the event to the oldest matching waiter; returns it if unclaimed
    fn dispatch(&mut self, event: ArtEvent) -> Option<ArtEvent> {
        let Some(pos) = self.waiters.iter().position(|(_, m, _)| m.matches(&event)) else {
            return Some(event);
        };
        let (_, _, tx) = self.waiters.remove(pos);
        // Receiver may have timed out already
        let _ = tx.send(event);
        None
    }

    fn clear(&mut self) {
        self.waiters.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.waiters.len()
    }
}

type SharedReplies = Arc<Mutex<PendingReplies>>;

fn lock(pending: &SharedReplies) -> std::sync::MutexGuard<'_, PendingReplies> {
    // Poisoning only means a pump panicked; the waiter list is still valid
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

// ============================================================================
// Pumps
// ============================================================================

/// Reads frames from the TV and dispatches them
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: SharedReplies,
    art_mode: watch::Sender<Option<bool>>,
    write_tx: mpsc::Sender<Message>,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_text(&text, &pending, &art_mode),
            Ok(Message::Ping(data)) => {
                trace!("received ping, sending pong");
                let _ = write_tx.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                debug!("TV closed the art channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Art channel read error: {}", e);
                break;
            }
        }
    }

    // Wake every waiter with a closed channel
    lock(&pending).clear();
}

fn handle_text(text: &str, pending: &SharedReplies, art_mode: &watch::Sender<Option<bool>>) {
    let event = match parse_incoming(text) {
        Ok(Incoming::Art(event)) => event,
        Ok(other) => {
            trace!("channel event: {:?}", other);
            return;
        }
        Err(e) => {
            warn!("Failed to parse message from TV: {}", e);
            return;
        }
    };

    if let Some(on) = event.art_mode() {
        debug!("art mode is now {}", if on { "on" } else { "off" });
        art_mode.send_replace(Some(on));
    }

    if let Some(unclaimed) = lock(pending).dispatch(event) {
        trace!("unsolicited art event: {}", unclaimed.event);
    }
}

/// Writes queued frames to the TV until a close frame goes out
async fn write_pump<S>(mut write: S, mut rx: mpsc::Receiver<Message>)
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let closing = matches!(msg, Message::Close(_));
        if let Err(e) = write.send(msg).await {
            warn!("Art channel write error: {}", e);
            break;
        }
        if closing {
            break;
        }
    }
    let _ = write.close().await;
}

/// Waits for the channel to accept us; returns a newly issued token, if any
pub(crate) async fn handshake<S>(read: &mut S) -> Result<Option<String>, DeviceError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut token = None;
    let mut connected = false;

    loop {
        let wait = if connected { READY_GRACE } else { CONNECT_TIMEOUT };
        let next = match tokio::time::timeout(wait, read.next()).await {
            Ok(next) => next,
            Err(_) if connected => {
                debug!("No ms.channel.ready from TV, continuing");
                return Ok(token);
            }
            Err(_) => return Err(DeviceError::NoData("ms.channel.connect".to_string())),
        };

        match next {
            Some(Ok(Message::Text(text))) => match parse_incoming(&text) {
                Ok(Incoming::Connect { token: issued }) => {
                    connected = true;
                    token = issued;
                }
                Ok(Incoming::Ready) => return Ok(token),
                Ok(Incoming::Unauthorized) => return Err(DeviceError::Unauthorized),
                Ok(_) => {}
                Err(e) => warn!("Failed to parse handshake message: {}", e),
            },
            Some(Ok(Message::Close(_))) | None => {
                return Err(DeviceError::Connection(
                    "TV closed the connection during handshake".to_string(),
                ))
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(DeviceError::Connection(e.to_string())),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Live art channel session with one TV
pub struct SamsungArtSession {
    options: SessionOptions,
    rest: RestClient,
    write_tx: mpsc::Sender<Message>,
    pending: SharedReplies,
    art_mode: watch::Receiver<Option<bool>>,
    read_handle: JoinHandle<()>,
    write_handle: JoinHandle<()>,
    closed: bool,
}

impl SamsungArtSession {
    /// Connect to the TV and start listening for events
    pub async fn connect(options: SessionOptions) -> Result<Self, DeviceError> {
        let token = options.saved_token();
        let url = channel_url(
            &options.host,
            options.port,
            &options.client_name,
            token.as_deref(),
        );
        info!("Connecting to {}:{}", options.host, options.port);
        debug!("Art channel URL: {}", url);

        let connector = if options.port == 8002 {
            let config =
                insecure_client_config().map_err(|e| DeviceError::Connection(e.to_string()))?;
            Some(Connector::Rustls(config))
        } else {
            None
        };

        let (ws, _) = tokio::time::timeout(
            CONNECT_TIMEOUT,
            tokio_tungstenite::connect_async_tls_with_config(url, None, false, connector),
        )
        .await
        .map_err(|_| DeviceError::Connection("timed out opening art channel".to_string()))?
        .map_err(|e| DeviceError::Connection(e.to_string()))?;

        let (write, mut read) = ws.split();

        if let Some(issued) = handshake(&mut read).await? {
            if token.as_deref() != Some(issued.as_str()) {
                options.save_token(&issued);
            }
        }
        info!("Art channel ready");

        let rest = RestClient::new(&options.host, options.port, options.request_timeout)?;
        let (write_tx, write_rx) = mpsc::channel::<Message>(64);
        let pending: SharedReplies = Arc::default();
        let (mode_tx, mode_rx) = watch::channel(None);

        let write_handle = tokio::spawn(write_pump(write, write_rx));
        let read_handle = tokio::spawn(read_pump(read, pending.clone(), mode_tx, write_tx.clone()));

        Ok(Self {
            options,
            rest,
            write_tx,
            pending,
            art_mode: mode_rx,
            read_handle,
            write_handle,
            closed: false,
        })
    }

    /// Send an art app request and wait for the matching reply
    async fn request(
        &self,
        request: &str,
        fields: Value,
        reply_event: Option<&str>,
        wait: Duration,
    ) -> Result<Option<ArtEvent>, DeviceError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let matcher = ReplyMatch {
            request_id: request_id.clone(),
            event: reply_event.map(str::to_string),
        };
        let (ticket, rx) = lock(&self.pending).register(matcher);

        debug!("-> {} ({})", request, request_id);
        let frame = art_request(request, &request_id, fields);
        if self.write_tx.send(Message::Text(frame.into())).await.is_err() {
            lock(&self.pending).cancel(ticket);
            return Err(DeviceError::Connection("art channel closed".to_string()));
        }

        let reply = tokio::time::timeout(wait, rx).await;
        lock(&self.pending).cancel(ticket);

        match reply {
            Ok(Ok(event)) if event.is_error() => Err(DeviceError::Response {
                request: request.to_string(),
                message: event.error_message(),
            }),
            Ok(Ok(event)) => {
                debug!("<- {} ({})", event.event, request_id);
                Ok(Some(event))
            }
            Ok(Err(_)) => Err(DeviceError::Connection("art channel closed".to_string())),
            Err(_) => Ok(None),
        }
    }

    /// Request that must be answered within the request timeout
    async fn request_reply(
        &self,
        request: &str,
        fields: Value,
        reply_event: Option<&str>,
    ) -> Result<ArtEvent, DeviceError> {
        let awaited = reply_event.unwrap_or(request).to_string();
        self.request(request, fields, reply_event, self.options.request_timeout)
            .await?
            .ok_or(DeviceError::NoData(awaited))
    }

    /// Request the TV may or may not acknowledge; only an error reply fails it
    async fn request_ack(&self, request: &str, fields: Value) -> Result<(), DeviceError> {
        if self.request(request, fields, None, ACK_GRACE).await?.is_none() {
            trace!("{} not acknowledged, assuming success", request);
        }
        Ok(())
    }
}

#[async_trait]
impl ArtSession for SamsungArtSession {
    async fn supported(&mut self) -> Result<bool, DeviceError> {
        let info = self.rest.device_info().await?;
        debug!("TV model {} ({})", info.model, info.name);
        Ok(info.frame_tv_support)
    }

    async fn is_on(&mut self) -> Result<bool, DeviceError> {
        match self.rest.device_info().await {
            // Older firmware has no PowerState; answering at all means it is on
            Ok(info) => Ok(info.power_state.map(|s| s == "on").unwrap_or(true)),
            Err(DeviceError::Http(e)) => {
                debug!("TV did not answer info request: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn art_mode(&self) -> Option<bool> {
        *self.art_mode.borrow()
    }

    async fn current_artwork(&mut self) -> Result<ArtworkInfo, DeviceError> {
        let reply = self
            .request_reply("get_current_artwork", json!({}), None)
            .await?;

        let field = |key: &str| reply.str_field(key).map(str::to_string);
        Ok(ArtworkInfo {
            content_id: field("content_id").unwrap_or_default(),
            matte_id: field("matte_id"),
            portrait_matte_id: field("portrait_matte_id"),
            category_id: field("category_id"),
        })
    }

    async fn upload(
        &mut self,
        data: Vec<u8>,
        file_type: &str,
        matte: &str,
    ) -> Result<String, DeviceError> {
        let file_type = normalize_file_type(file_type);
        let file_size = data.len();
        let request = json!({
            "file_type": file_type,
            "conn_info": {
                "d2d_mode": "socket",
                "connection_id": rand::random::<u32>(),
                "id": uuid::Uuid::new_v4().to_string(),
            },
            "image_date": chrono::Local::now().format("%Y:%m:%d %H:%M:%S").to_string(),
            "matte_id": matte,
            "portrait_matte_id": matte,
            "file_size": file_size,
        });

        let ready = self
            .request_reply("send_image", request, Some("ready_to_use"))
            .await?;
        let conn = ConnInfo::from_event(&ready).ok_or_else(|| {
            DeviceError::Transfer("ready_to_use without usable conn_info".to_string())
        })?;
        let request_id = ready.request_id().unwrap_or_default().to_string();

        // Register before streaming so a fast reply is not lost
        let (ticket, added_rx) = lock(&self.pending).register(ReplyMatch {
            request_id,
            event: Some("image_added".to_string()),
        });

        let timeout = self.options.request_timeout;
        let transfer = {
            let file_type = file_type.clone();
            tokio::task::spawn_blocking(move || {
                send_image_blocking(&conn, &data, &file_type, timeout)
            })
        };
        let sent = transfer
            .await
            .map_err(|e| DeviceError::Transfer(e.to_string()))
            .and_then(|r| r);
        if let Err(e) = sent {
            lock(&self.pending).cancel(ticket);
            return Err(e);
        }

        let added = tokio::time::timeout(timeout, added_rx).await;
        lock(&self.pending).cancel(ticket);

        let event = match added {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => return Err(DeviceError::Connection("art channel closed".to_string())),
            Err(_) => return Err(DeviceError::NoData("image_added".to_string())),
        };
        if event.is_error() {
            return Err(DeviceError::Response {
                request: "send_image".to_string(),
                message: event.error_message(),
            });
        }

        event
            .str_field("content_id")
            .map(str::to_string)
            .ok_or_else(|| DeviceError::NoData("content_id in image_added".to_string()))
    }

    async fn set_photo_filter(
        &mut self,
        content_id: &str,
        filter: &str,
    ) -> Result<(), DeviceError> {
        self.request_ack(
            "set_photo_filter",
            json!({ "content_id": content_id, "filter_id": filter }),
        )
        .await
    }

    async fn select_image(&mut self, content_id: &str, show: bool) -> Result<(), DeviceError> {
        self.request_ack(
            "select_image",
            json!({ "category_id": null, "content_id": content_id, "show": show }),
        )
        .await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.write_tx.send(Message::Close(None)).await;
        if tokio::time::timeout(Duration::from_secs(2), &mut self.write_handle)
            .await
            .is_err()
        {
            self.write_handle.abort();
        }
        self.read_handle.abort();
        lock(&self.pending).clear();
        info!("Closed connection to {}", self.options.host);
    }
}

impl Drop for SamsungArtSession {
    fn drop(&mut self) {
        self.read_handle.abort();
        self.write_handle.abort();
    }
}
