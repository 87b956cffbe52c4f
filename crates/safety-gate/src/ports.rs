use async_trait::async_trait;

/// Blocking yes/no prompt, injected so gate decisions stay testable
/// without a real interactive surface.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Deterministic confirmer for tests and non-interactive runs.
pub struct AutoConfirmer(pub bool);

#[async_trait]
impl Confirmer for AutoConfirmer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
