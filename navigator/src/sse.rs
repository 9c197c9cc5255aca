//! Server-sent event feed for collection notifications.
//!
//! Connects to the server's events endpoint and republishes
//! `object-created`, `object-changed` and `object-deleted` events on an
//! [`ObjectEventBus`], reconnecting with exponential backoff when the
//! connection drops.

use std::sync::Arc;
use std::time::Duration;

use crate::config::NavigatorConfig;
use crate::error::NavigatorError;
use crate::error::Result;
use crate::events::ObjectEventBus;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use obsnav_protocol::ObjectEvent;
use obsnav_protocol::ObjectEventKind;
use obsnav_protocol::ObjectRef;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

/// Long-lived subscription to the server's notification stream.
pub struct EventFeed {
    http: reqwest::Client,
    url: Url,
    credentials: Option<(String, Option<String>)>,
    backoff: ExponentialBackoff,
}

impl EventFeed {
    pub fn new(config: &NavigatorConfig) -> Result<Self> {
        // No overall timeout: the response body never finishes.
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            url: config.events_url()?,
            credentials: config
                .username
                .clone()
                .map(|username| (username, config.password.clone())),
            backoff: ExponentialBackoff::new(
                Duration::from_millis(config.reconnect_initial_ms),
                Duration::from_millis(config.reconnect_max_ms),
                config.reconnect_multiplier,
            ),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn spawn(self, bus: Arc<ObjectEventBus>) -> JoinHandle<()> {
        tokio::spawn(self.run(bus))
    }

    /// Pump events into `bus` until every subscriber is gone.
    ///
    /// Every reconnect waits out the backoff, including after a clean end of
    /// stream; the delay only resets once an event has been received.
    pub async fn run(mut self, bus: Arc<ObjectEventBus>) {
        loop {
            let outcome = self.connect_and_stream(&bus).await;
            let delay = self.backoff.next_delay();
            match outcome {
                Ok(()) => info!(
                    reconnect_in_ms = delay.as_millis(),
                    "event stream ended, will reconnect"
                ),
                Err(err) => warn!(
                    error = %err,
                    reconnect_in_ms = delay.as_millis(),
                    "event stream failed, will reconnect"
                ),
            }
            tokio::time::sleep(delay).await;
            if Arc::strong_count(&bus) == 1 {
                debug!("no one left to notify; stopping event feed");
                return;
            }
        }
    }

    async fn connect_and_stream(&mut self, bus: &ObjectEventBus) -> Result<()> {
        info!(url = %self.url, "connecting to events endpoint");
        let mut request = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NavigatorError::Status { status, body });
        }
        info!("connected to events endpoint");

        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event.map_err(|err| NavigatorError::Stream(err.to_string()))?;
            self.backoff.reset();
            match parse_event(&event.event, &event.data) {
                Ok(Some(event)) => {
                    bus.publish(event);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, event_type = %event.event, "failed to parse event");
                }
            }
        }
        Ok(())
    }
}

/// Decode one server-sent event. Unknown event types yield `None`.
pub fn parse_event(event_type: &str, data: &str) -> Result<Option<ObjectEvent>> {
    let Some(kind) = ObjectEventKind::from_event_name(event_type) else {
        debug!(event_type, "ignoring event");
        return Ok(None);
    };
    let object: ObjectRef = serde_json::from_str(data)?;
    Ok(Some(ObjectEvent { kind, object }))
}

/// Exponential backoff with ±25% jitter.
#[derive(Debug)]
struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    current: Duration,
}

impl ExponentialBackoff {
    fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            current: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(
            self.max,
            Duration::from_secs_f64(self.current.as_secs_f64() * self.multiplier),
        );
        let jitter = rand::random::<f64>() * 0.5 - 0.25;
        Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter))
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}
