pub mod fetch;
pub mod stealth;

use async_trait::async_trait;
use std::time::Duration;

pub use fetch::{fetch_with_retry, FetchPolicy};
pub use stealth::ChromeSessionProvider;

/// One loaded browser page. Implementations own their tab and release it on drop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates and returns the main document's HTTP status, or `None` when
    /// the browser reported no response.
    async fn goto(&self, url: &str, timeout: Duration) -> anyhow::Result<Option<u16>>;

    /// Serialized DOM of the current document.
    async fn html(&self) -> anyhow::Result<String>;
}

/// Factory for isolated, stealth-configured pages.
///
/// Every call yields a fresh browser context; nothing is shared between the
/// pages it hands out.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> crate::Result<Box<dyn Page>>;
}
