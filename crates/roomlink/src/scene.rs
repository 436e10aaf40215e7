/// Scene loading seam. Rendering is owned by the embedding client; the
/// controllers only need to know when a switch has passed its completion
/// threshold, so each method resolves at that point.
#[async_trait::async_trait]
pub trait SceneDirector: Send + Sync + 'static {
    /// Switch to the discovery/lobby context.
    async fn load_lobby(&self);
    /// Switch to the in-session game context.
    async fn load_game(&self);
}
