use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::rest::DiscordRestClient;
use super::types::{
    GatewayPayload, Hello, IncomingMessage, MessageCreate, Ready, DEFAULT_INTENTS, OP_DISPATCH,
    OP_HEARTBEAT, OP_HEARTBEAT_ACK, OP_HELLO, OP_IDENTIFY, OP_INVALID_SESSION, OP_RECONNECT,
};
use crate::error::AppError;
use crate::event::{AppEvent, GatewayStatus};

/// Exponential backoff for reconnection.
struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

pub fn gateway_connect_url(base: &str) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("invalid gateway url '{}'", base))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("v", "10")
        .append_pair("encoding", "json");
    Ok(url.to_string())
}

fn identify_payload(token: &str, intents: u64) -> serde_json::Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "premarket-bot",
                "device": "premarket-bot"
            }
        }
    })
}

/// Keep only human messages with content and a numeric channel id.
fn to_incoming(msg: MessageCreate, bot_user_id: &str) -> Option<IncomingMessage> {
    if msg.author.bot || msg.author.id == bot_user_id || msg.content.is_empty() {
        return None;
    }
    let Ok(channel_id) = msg.channel_id.parse::<u64>() else {
        tracing::debug!(channel_id = %msg.channel_id, "non-numeric channel id");
        return None;
    };
    Some(IncomingMessage {
        channel_id,
        author: msg.author.username,
        content: msg.content,
    })
}

/// How a single gateway session ended.
enum SessionEnd {
    Shutdown,
    Resumable,
}

pub struct DiscordGateway {
    rest: Arc<DiscordRestClient>,
    bot_token: String,
    intents: u64,
}

impl DiscordGateway {
    pub fn new(rest: Arc<DiscordRestClient>, bot_token: &str) -> Self {
        Self {
            rest,
            bot_token: bot_token.to_string(),
            intents: DEFAULT_INTENTS,
        }
    }

    /// Connect and keep the session alive, reconnecting with backoff.
    /// User messages go to `message_tx`, status changes to `status_tx`.
    pub async fn connect_and_run(
        &self,
        message_tx: mpsc::Sender<IncomingMessage>,
        status_tx: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = self
                .connect_once(&message_tx, &status_tx, &mut shutdown)
                .await;
            let _ = status_tx
                .send(AppEvent::Gateway(GatewayStatus::Disconnected))
                .await;

            let delay = match result {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Resumable) => {
                    backoff.reset();
                    attempt = 0;
                    Duration::from_secs(1)
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), attempt, "gateway session failed");
                    let _ = status_tx
                        .send(AppEvent::Error(format!("gateway error: {:#}", e)))
                        .await;
                    backoff.next_delay()
                }
            };

            let _ = status_tx
                .send(AppEvent::Gateway(GatewayStatus::Reconnecting {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                }))
                .await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => continue,
                _ = shutdown.changed() => {
                    tracing::info!("shutdown during gateway reconnect");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        message_tx: &mpsc::Sender<IncomingMessage>,
        status_tx: &mpsc::Sender<AppEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        let base = self
            .rest
            .gateway_url()
            .await
            .context("failed to fetch gateway url")?;
        let ws_url = gateway_connect_url(&base)?;
        tracing::info!(url = %ws_url, "connecting to Discord gateway");
        let _ = status_tx
            .send(AppEvent::LogMessage(format!("Connecting to {}", ws_url)))
            .await;

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .context("gateway WebSocket connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        let hello = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let payload: GatewayPayload =
                        serde_json::from_str(&text).context("invalid gateway hello")?;
                    if payload.op != OP_HELLO {
                        return Err(AppError::Gateway(format!(
                            "expected hello, got op {}",
                            payload.op
                        ))
                        .into());
                    }
                    let hello: Hello =
                        serde_json::from_value(payload.d).context("invalid hello payload")?;
                    break hello;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(anyhow!("WebSocket read error: {}", e)),
                None => return Err(anyhow!("gateway closed before hello")),
            }
        };

        write
            .send(Message::Text(
                identify_payload(&self.bot_token, self.intents).to_string(),
            ))
            .await
            .context("failed to send identify")?;

        let _ = status_tx
            .send(AppEvent::Gateway(GatewayStatus::Connected))
            .await;

        let period = Duration::from_millis(hello.heartbeat_interval.max(1));
        let mut heartbeat =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut last_seq: Option<u64> = None;
        let mut awaiting_ack = false;
        let mut bot_user_id = String::new();

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if awaiting_ack {
                        return Err(AppError::Gateway("heartbeat not acknowledged".to_string()).into());
                    }
                    write
                        .send(Message::Text(json!({"op": OP_HEARTBEAT, "d": last_seq}).to_string()))
                        .await
                        .context("failed to send heartbeat")?;
                    awaiting_ack = true;
                }
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(frame))) => {
                            return Err(anyhow!("gateway closed: {:?}", frame));
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(anyhow!("WebSocket read error: {}", e)),
                        None => return Err(anyhow!("gateway stream ended")),
                    };
                    let payload: GatewayPayload = match serde_json::from_str(&text) {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::debug!(error = %e, "failed to parse gateway payload");
                            continue;
                        }
                    };
                    if payload.s.is_some() {
                        last_seq = payload.s;
                    }
                    match payload.op {
                        OP_HEARTBEAT_ACK => awaiting_ack = false,
                        OP_HEARTBEAT => {
                            write
                                .send(Message::Text(json!({"op": OP_HEARTBEAT, "d": last_seq}).to_string()))
                                .await
                                .context("failed to answer heartbeat request")?;
                        }
                        OP_RECONNECT => {
                            tracing::info!("gateway requested reconnect");
                            return Ok(SessionEnd::Resumable);
                        }
                        OP_INVALID_SESSION => {
                            return Err(AppError::Gateway("invalid session".to_string()).into());
                        }
                        OP_DISPATCH => {
                            self.handle_dispatch(payload, &mut bot_user_id, message_tx, status_tx).await;
                        }
                        _ => {}
                    }
                }
                _ = shutdown.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }

    async fn handle_dispatch(
        &self,
        payload: GatewayPayload,
        bot_user_id: &mut String,
        message_tx: &mpsc::Sender<IncomingMessage>,
        status_tx: &mpsc::Sender<AppEvent>,
    ) {
        match payload.t.as_deref() {
            Some("READY") => match serde_json::from_value::<Ready>(payload.d) {
                Ok(ready) => {
                    tracing::info!(user = %ready.user.username, "logged in and ready to receive commands");
                    *bot_user_id = ready.user.id;
                    let _ = status_tx
                        .send(AppEvent::LoggedIn {
                            user: ready.user.username,
                        })
                        .await;
                }
                Err(e) => tracing::warn!(error = %e, "malformed READY payload"),
            },
            Some("MESSAGE_CREATE") => {
                let msg: MessageCreate = match serde_json::from_value(payload.d) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::debug!(error = %e, "malformed MESSAGE_CREATE payload");
                        return;
                    }
                };
                let Some(incoming) = to_incoming(msg, bot_user_id.as_str()) else {
                    return;
                };
                if message_tx.try_send(incoming).is_err() {
                    tracing::warn!("message channel full, dropping message");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(author_id: &str, bot: bool, channel_id: &str, content: &str) -> MessageCreate {
        serde_json::from_value(json!({
            "id": "900",
            "channel_id": channel_id,
            "author": {"id": author_id, "username": "trader", "bot": bot},
            "content": content
        }))
        .unwrap()
    }

    fn dispatch(t: &str, d: serde_json::Value) -> GatewayPayload {
        GatewayPayload {
            op: OP_DISPATCH,
            d,
            s: Some(1),
            t: Some(t.to_string()),
        }
    }

    fn gateway() -> DiscordGateway {
        let rest =
            DiscordRestClient::new("http://127.0.0.1:9", "tok", Duration::from_secs(1)).unwrap();
        DiscordGateway::new(Arc::new(rest), "tok")
    }

    #[test]
    fn human_message_becomes_incoming() {
        let incoming = to_incoming(message("42", false, "1234", "!ping"), "7").unwrap();
        assert_eq!(
            incoming,
            IncomingMessage {
                channel_id: 1234,
                author: "trader".to_string(),
                content: "!ping".to_string(),
            }
        );
    }

    #[test]
    fn bot_and_own_messages_are_ignored() {
        assert!(to_incoming(message("42", true, "1234", "!ping"), "7").is_none());
        assert!(to_incoming(message("7", false, "1234", "!ping"), "7").is_none());
    }

    #[test]
    fn empty_content_and_bad_channel_are_dropped() {
        assert!(to_incoming(message("42", false, "1234", ""), "7").is_none());
        assert!(to_incoming(message("42", false, "general", "!ping"), "7").is_none());
    }

    #[tokio::test]
    async fn ready_records_bot_user_and_filters_its_echo() {
        let gateway = gateway();
        let (message_tx, mut message_rx) = mpsc::channel(8);
        let (status_tx, mut status_rx) = mpsc::channel(8);
        let mut bot_user_id = String::new();

        let ready = dispatch(
            "READY",
            json!({"user": {"id": "555", "username": "premarket", "bot": true}}),
        );
        gateway
            .handle_dispatch(ready, &mut bot_user_id, &message_tx, &status_tx)
            .await;
        assert_eq!(bot_user_id, "555");
        assert_eq!(
            status_rx.recv().await,
            Some(AppEvent::LoggedIn {
                user: "premarket".to_string()
            })
        );

        // the bot's own reply, without the bot flag, still matches by id
        let echo = dispatch(
            "MESSAGE_CREATE",
            json!({"id": "1", "channel_id": "10", "author": {"id": "555", "username": "premarket"}, "content": "!ping"}),
        );
        gateway
            .handle_dispatch(echo, &mut bot_user_id, &message_tx, &status_tx)
            .await;
        let human = dispatch(
            "MESSAGE_CREATE",
            json!({"id": "2", "channel_id": "10", "author": {"id": "42", "username": "trader"}, "content": "!watchlist"}),
        );
        gateway
            .handle_dispatch(human, &mut bot_user_id, &message_tx, &status_tx)
            .await;

        let received = message_rx.try_recv().unwrap();
        assert_eq!(received.content, "!watchlist");
        assert!(message_rx.try_recv().is_err());
    }

    #[test]
    fn connect_url_sets_version_and_encoding() {
        let url = gateway_connect_url("wss://gateway.discord.gg").unwrap();
        assert_eq!(url, "wss://gateway.discord.gg/?v=10&encoding=json");
    }

    #[test]
    fn identify_carries_token_and_intents() {
        let payload = identify_payload("tok", DEFAULT_INTENTS);
        assert_eq!(payload["op"], 2);
        assert_eq!(payload["d"]["token"], "tok");
        assert_eq!(payload["d"]["intents"], 33281);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(4), 2.0);
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }
}
