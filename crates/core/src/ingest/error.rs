use std::fmt;

#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data provider error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for ProviderError {}
