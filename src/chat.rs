use anyhow::Result;
use async_trait::async_trait;

/// Somewhere bot replies and scheduled posts can be delivered.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()>;
}
