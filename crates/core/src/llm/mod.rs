pub mod anthropic;
pub mod error;
pub mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
        }
    }
}

/// Opaque text-completion service. Calls may be slow or fail; callers own the timeout and
/// fallback.
#[async_trait::async_trait]
pub trait AdviceGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_advice(&self, prompt: &str) -> anyhow::Result<String>;
}
