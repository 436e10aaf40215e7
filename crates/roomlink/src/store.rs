pub mod in_memory;

/// Player preferences persisted across runs. Durable backends live with the
/// embedding client; this crate ships an in-memory implementation.
#[async_trait::async_trait]
pub trait PreferencesStore: Send + Sync + 'static {
    async fn nickname(&self) -> Option<String>;
    async fn set_nickname(&mut self, nickname: &str);
}
