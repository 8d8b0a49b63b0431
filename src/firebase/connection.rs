use futures_util::StreamExt;
use log::{debug, error, info, warn};
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use url::Url;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::firebase::stream::{handle_frame, EventTree, FrameOutcome, SseDecoder};
use crate::models::SnapshotEvent;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Handle to a Realtime Database instance.
///
/// Created once at startup and passed to whoever needs to subscribe.
/// Dropping it releases the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
    reconnect_delay: Duration,
    max_retries: usize,
}

impl FirebaseClient {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.database_url)
            .map_err(|e| DashboardError::InvalidUrl(format!("{}: {}", config.database_url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(DashboardError::InvalidUrl(format!(
                "{}: expected an http(s) base URL",
                config.database_url
            )));
        }

        // Joining relative paths needs a trailing slash on the base
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(FirebaseClient {
            http,
            base_url,
            auth_token: config.auth_token.clone(),
            reconnect_delay: config.reconnect_delay,
            max_retries: config.max_retries,
        })
    }

    /// REST streaming endpoint for a database path
    pub fn stream_url(&self, path: &str) -> Result<Url> {
        let path = path.trim_matches('/');
        let mut url = self
            .base_url
            .join(&format!("{path}.json"))
            .map_err(|e| DashboardError::InvalidUrl(format!("{path}: {e}")))?;

        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    /// Start streaming changes at `path` into `events`.
    ///
    /// The stream reconnects on failure, reporting each failure as an error
    /// event. It stops when the subscription is released, the receiver is
    /// dropped, the server cancels the subscription, or the retry limit is
    /// exceeded.
    pub fn subscribe(
        &self,
        path: &str,
        events: mpsc::Sender<SnapshotEvent>,
    ) -> Result<Subscription> {
        let url = self.stream_url(path)?;
        let client = self.clone();
        let task_path = path.to_string();

        let handle = tokio::spawn(async move {
            client.stream_with_retry(&task_path, url, events).await;
        });

        info!("Subscribed to '{}'", path);
        Ok(Subscription {
            path: path.to_string(),
            handle,
        })
    }

    async fn stream_with_retry(&self, path: &str, url: Url, events: mpsc::Sender<SnapshotEvent>) {
        let mut delivery = Delivery::default();

        loop {
            let err = match self.stream_once(path, &url, &events, &mut delivery).await {
                Ok(()) => {
                    debug!("Receiver for '{}' dropped, stopping stream", path);
                    return;
                }
                Err(e) => e,
            };

            delivery.failures += 1;
            warn!(
                "Stream for '{}' failed (attempt {}): {}",
                path, delivery.failures, err
            );

            if events.send(SnapshotEvent::Error(err.to_string())).await.is_err() {
                return;
            }

            if let DashboardError::Cancelled(_) = err {
                error!("Server cancelled '{}', not reconnecting", path);
                return;
            }

            if self.max_retries > 0 && delivery.failures > self.max_retries {
                error!(
                    "Giving up on '{}' after {} failed attempts",
                    path, delivery.failures
                );
                return;
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Stream until the connection fails. Returns `Ok` only once the
    /// receiver is gone.
    async fn stream_once(
        &self,
        path: &str,
        url: &Url,
        events: &mpsc::Sender<SnapshotEvent>,
        delivery: &mut Delivery,
    ) -> Result<()> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::Status(response.status()));
        }
        debug!("Stream for '{}' open", path);

        // The server starts every connection with a full put of the path,
        // unchanged data is filtered out by `delivery`
        let mut tree = EventTree::default();
        let mut decoder = SseDecoder::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;

            for frame in decoder.feed(&chunk) {
                match handle_frame(&mut tree, &frame) {
                    Ok(FrameOutcome::Update(event)) => {
                        let event = match delivery.update(event) {
                            Some(event) => event,
                            None => continue,
                        };
                        if events.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(FrameOutcome::Ignored) => {
                        debug!("Ignoring '{}' event on '{}'", frame.event, path);
                    }
                    Ok(FrameOutcome::Closed(reason)) => {
                        return Err(DashboardError::Cancelled(reason));
                    }
                    Err(e) => {
                        warn!("Skipping '{}' event on '{}': {}", frame.event, path, e);
                    }
                }
            }
        }

        Err(DashboardError::Stream("connection closed by server".into()))
    }
}

/// What the subscriber has been told so far, kept across reconnects
#[derive(Debug, Default)]
struct Delivery {
    last: Option<SnapshotEvent>,
    failures: usize,
}

impl Delivery {
    /// The event to forward for a tree update, if any.
    ///
    /// Any update clears the failure count. An update equal to the last one
    /// delivered is dropped, unless a failure was reported since. In that
    /// case unchanged data only announces that the stream is back.
    fn update(&mut self, event: SnapshotEvent) -> Option<SnapshotEvent> {
        let recovering = self.failures > 0;
        self.failures = 0;

        if self.last.as_ref() != Some(&event) {
            self.last = Some(event.clone());
            return Some(event);
        }

        match event {
            SnapshotEvent::Data(_) if recovering => Some(SnapshotEvent::Resumed),
            _ if recovering => Some(event),
            _ => None,
        }
    }
}

/// A running subscription. Dropping it stops the stream.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn unsubscribe(self) {
        info!("Unsubscribing from '{}'", self.path);
        // Drop aborts the task
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
