//! Hook registry
//!
//! Holds the optional request interceptors (user agent, proxy) and event
//! observers (fetch, error) the fetch state machine invokes. There is one slot
//! per kind; registering a hook for a kind that already has one replaces it.

mod traits;

pub use traits::{ErrorObserver, FetchObserver, ProxyHook, ProxyTarget, UserAgentHook};

use crate::{CrawlError, HookError};
use std::fmt;
use std::sync::Arc;

/// A request interceptor, tagged by the kind of slot it fills
#[derive(Clone)]
pub enum RequestHook {
    Agent(Arc<dyn UserAgentHook>),
    Proxy(Arc<dyn ProxyHook>),
}

/// An event observer, tagged by the kind of slot it fills
#[derive(Clone)]
pub enum Observer {
    Fetch(Arc<dyn FetchObserver>),
    Error(Arc<dyn ErrorObserver>),
}

/// Values request interceptors applied to one outgoing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDecoration {
    pub user_agent: Option<String>,
    pub proxy: Option<ProxyTarget>,
}

/// Single-slot storage for interceptors and observers
#[derive(Clone, Default)]
pub struct HookRegistry {
    agent: Option<Arc<dyn UserAgentHook>>,
    proxy: Option<Arc<dyn ProxyHook>>,
    fetch: Option<Arc<dyn FetchObserver>>,
    error: Option<Arc<dyn ErrorObserver>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request interceptor, replacing any earlier one of the same kind
    pub fn register_request_hook(&mut self, hook: RequestHook) {
        let (kind, replaced) = match hook {
            RequestHook::Agent(h) => ("agent", self.agent.replace(h).is_some()),
            RequestHook::Proxy(h) => ("proxy", self.proxy.replace(h).is_some()),
        };
        log_registration(kind, replaced);
    }

    /// Registers an observer, replacing any earlier one of the same kind
    pub fn register_observer(&mut self, observer: Observer) {
        let (kind, replaced) = match observer {
            Observer::Fetch(o) => ("fetch", self.fetch.replace(o).is_some()),
            Observer::Error(o) => ("error", self.error.replace(o).is_some()),
        };
        log_registration(kind, replaced);
    }

    pub fn use_agent(&mut self, hook: impl UserAgentHook + 'static) {
        self.register_request_hook(RequestHook::Agent(Arc::new(hook)));
    }

    pub fn use_proxy(&mut self, hook: impl ProxyHook + 'static) {
        self.register_request_hook(RequestHook::Proxy(Arc::new(hook)));
    }

    pub fn on_fetch(&mut self, observer: impl FetchObserver + 'static) {
        self.register_observer(Observer::Fetch(Arc::new(observer)));
    }

    pub fn on_error(&mut self, observer: impl ErrorObserver + 'static) {
        self.register_observer(Observer::Error(Arc::new(observer)));
    }

    /// Runs the request interceptors for one outgoing request
    ///
    /// The agent hook runs first, then the proxy hook; each is awaited before
    /// the next. The first failure aborts the decoration.
    pub async fn decorate(&self) -> Result<RequestDecoration, HookError> {
        let mut decoration = RequestDecoration::default();

        if let Some(agent) = &self.agent {
            decoration.user_agent = Some(agent.user_agent().await?);
        }

        if let Some(proxy) = &self.proxy {
            decoration.proxy = Some(proxy.proxy().await?);
        }

        Ok(decoration)
    }

    /// Notifies the fetch observer, if one is registered
    pub async fn notify_fetch(&self, url: &str, body: &str) -> Result<(), HookError> {
        match &self.fetch {
            Some(observer) => observer.on_fetch(url, body).await,
            None => Ok(()),
        }
    }

    /// Notifies the error observer, if one is registered
    ///
    /// A failing error observer is logged and otherwise ignored.
    pub async fn notify_error(&self, url: &str, error: &CrawlError) {
        if let Some(observer) = &self.error {
            if let Err(e) = observer.on_error(url, error).await {
                tracing::warn!("Error observer failed for {}: {}", url, e);
            }
        }
    }

    pub fn has_fetch_observer(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn has_error_observer(&self) -> bool {
        self.error.is_some()
    }
}

fn log_registration(kind: &str, replaced: bool) {
    if replaced {
        tracing::debug!("Replacing previously registered {} hook", kind);
    } else {
        tracing::debug!("Registered {} hook", kind);
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("agent", &self.agent.is_some())
            .field("proxy", &self.proxy.is_some())
            .field("fetch", &self.fetch.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}
