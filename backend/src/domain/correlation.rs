//! Request-scoped correlation context.
//!
//! A [`CorrelationContext`] is created once per inbound request and held in
//! Tokio task-local storage while that request's future runs. Code executing
//! as part of the request (however deeply nested, across every `.await`) can
//! read it with [`CorrelationContext::current`] without threading it through
//! function signatures.
//!
//! Task-locals are bound to the future they scope, not to the worker thread,
//! so two requests interleaved on the same single-threaded actix worker never
//! observe each other's context. They are also not inherited by
//! `tokio::spawn`; wrap spawned work in [`CorrelationContext::propagate`] so it
//! sees the context of the point where it was scheduled.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::task_local;
use uuid::Uuid;

/// Header used to accept an inbound correlation identifier and echo it back.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const UNKNOWN_CLIENT: &str = "unknown";

task_local! {
    static CONTEXT: Arc<CorrelationContext>;
}

/// Correlation identifier tying log records and the response header to one
/// inbound request.
///
/// # Examples
/// ```
/// use auth_backend::domain::RequestId;
///
/// let reused = RequestId::resolve(Some("abc-123"));
/// assert_eq!(reused.as_str(), "abc-123");
///
/// let generated = RequestId::resolve(None);
/// assert_eq!(generated.as_str().len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random (UUID v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse an inbound identifier verbatim.
    ///
    /// Returns `None` for blank values so callers fall back to generation.
    #[must_use]
    pub fn from_inbound(value: &str) -> Option<Self> {
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value.to_owned()))
        }
    }

    /// Reuse the inbound identifier when supplied, otherwise generate one.
    #[must_use]
    pub fn resolve(inbound: Option<&str>) -> Self {
        inbound
            .and_then(Self::from_inbound)
            .unwrap_or_else(Self::generate)
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-neutral view of the request attributes the context captures.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundRequest<'a> {
    /// Correlation id supplied by the caller, if any.
    pub request_id: Option<&'a str>,
    /// HTTP method (or equivalent verb).
    pub method: &'a str,
    /// Request path including the query string.
    pub path: &'a str,
    /// Best-effort client address.
    pub client_ip: Option<&'a str>,
}

/// Immutable per-request correlation data.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    request_id: RequestId,
    method: String,
    path: String,
    client_ip: String,
    started_at: Instant,
    received_at: DateTime<Utc>,
}

impl CorrelationContext {
    /// Create the context for a newly arrived request.
    ///
    /// # Examples
    /// ```
    /// use auth_backend::domain::{CorrelationContext, InboundRequest};
    ///
    /// let context = CorrelationContext::begin(InboundRequest {
    ///     request_id: Some("req-1"),
    ///     method: "GET",
    ///     path: "/health",
    ///     client_ip: None,
    /// });
    /// assert_eq!(context.request_id().as_str(), "req-1");
    /// assert_eq!(context.client_ip(), "unknown");
    /// ```
    #[must_use]
    pub fn begin(request: InboundRequest<'_>) -> Self {
        Self {
            request_id: RequestId::resolve(request.request_id),
            method: request.method.to_owned(),
            path: request.path.to_owned(),
            client_ip: request.client_ip.unwrap_or(UNKNOWN_CLIENT).to_owned(),
            started_at: Instant::now(),
            received_at: Utc::now(),
        }
    }

    /// Return the context of the request currently executing, if any.
    #[must_use]
    pub fn current() -> Option<Arc<Self>> {
        CONTEXT.try_with(Arc::clone).ok()
    }

    /// Run `fut` with `context` ambient for its whole execution.
    ///
    /// The context is dropped from scope when `fut` completes or is dropped,
    /// so an aborted request leaves nothing behind for later work.
    pub async fn scope<Fut>(context: Arc<Self>, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CONTEXT.scope(context, fut).await
    }

    /// Capture the current context (if any) so `fut` observes it even when
    /// driven by a different task, e.g. after `tokio::spawn`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use auth_backend::domain::{CorrelationContext, InboundRequest};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let context = Arc::new(CorrelationContext::begin(InboundRequest {
    ///     request_id: Some("spawned"),
    ///     ..InboundRequest::default()
    /// }));
    /// let observed = CorrelationContext::scope(context, async {
    ///     let task = tokio::spawn(CorrelationContext::propagate(async {
    ///         CorrelationContext::current().map(|c| c.request_id().to_string())
    ///     }));
    ///     task.await.unwrap()
    /// })
    /// .await;
    /// assert_eq!(observed.as_deref(), Some("spawned"));
    /// # });
    /// ```
    pub fn propagate<Fut>(fut: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future,
    {
        let captured = Self::current();
        async move {
            match captured {
                Some(context) => CONTEXT.scope(context, fut).await,
                None => fut.await,
            }
        }
    }

    /// Correlation identifier for this request.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path including the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Client address, or `unknown`.
    #[must_use]
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Wall-clock arrival time.
    #[must_use]
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Time elapsed since the request arrived.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Fields merged into every log record emitted under this context.
    #[must_use]
    pub fn log_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("requestId".to_owned(), Value::from(self.request_id.as_str()));
        fields.insert("method".to_owned(), Value::from(self.method.as_str()));
        fields.insert("path".to_owned(), Value::from(self.path.as_str()));
        fields.insert("clientIp".to_owned(), Value::from(self.client_ip.as_str()));
        fields
    }
}
