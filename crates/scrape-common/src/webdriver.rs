//! Browser automation over the WebDriver protocol.
//!
//! Review pages are rendered client-side, so they are loaded in a real
//! (headless) browser driven through a WebDriver endpoint such as
//! `chromedriver --port=9515`. Each launched session owns one browser process,
//! which is torn down again by [`BrowserSession::close`].

use std::time::Duration;

use fantoccini::{ClientBuilder, Locator};
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::CommonError;

/// Starts browser sessions.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, CommonError>>;
}

/// One live browser. Must be closed explicitly to release the browser process.
pub trait BrowserSession: Send {
    /// Navigate to `url`, let the page settle, and return the trimmed text of
    /// every element matching the CSS `selector`, in document order.
    fn collect_texts<'a>(
        &'a mut self,
        url: &'a str,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, CommonError>>;

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), CommonError>>;
}

#[derive(Clone, Debug)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    settle: Duration,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: &str, settle: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            settle,
        }
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, CommonError>> {
        async move {
            let mut caps = serde_json::Map::new();
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless", "--disable-gpu", "--no-sandbox"] }),
            );

            info!(webdriver = %self.webdriver_url, "starting headless browser session");
            let mut builder = ClientBuilder::native();
            builder.capabilities(caps);
            let client = builder.connect(&self.webdriver_url).await?;

            let session: Box<dyn BrowserSession> = Box::new(WebDriverSession {
                client,
                settle: self.settle,
            });
            Ok(session)
        }
        .boxed()
    }
}

struct WebDriverSession {
    client: fantoccini::Client,
    settle: Duration,
}

impl BrowserSession for WebDriverSession {
    fn collect_texts<'a>(
        &'a mut self,
        url: &'a str,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, CommonError>> {
        async move {
            self.client.goto(url).await?;
            // Reviews are injected by scripts after the load event.
            tokio::time::sleep(self.settle).await;

            let elements = self.client.find_all(Locator::Css(selector)).await?;
            let mut texts = Vec::with_capacity(elements.len());
            for element in elements {
                match element.text().await {
                    Ok(text) => texts.push(text.trim().to_string()),
                    Err(e) => warn!(error = %e, url, "failed to read element text"),
                }
            }
            debug!(url, count = texts.len(), "collected element texts");
            Ok(texts)
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), CommonError>> {
        async move {
            info!("closing browser session");
            self.client.close().await?;
            Ok(())
        }
        .boxed()
    }
}
