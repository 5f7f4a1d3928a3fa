use serde::Serialize;
use utoipa::ToSchema;

/// Single-slot error banner. The latest message replaces the previous one.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ErrorBanner {
    message: Option<String>,
    shown: u64,
}

impl ErrorBanner {
    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.shown += 1;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Messages shown since the banner was created, including replaced ones.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}
