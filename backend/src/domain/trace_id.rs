//! Request correlation identifier.
//!
//! Every inbound request runs inside a [`TraceId::scope`]. Errors raised while
//! the scope is active pick the identifier up automatically, so log lines and
//! error payloads for one request share the same value. Task-local values do
//! not follow `tokio::spawn`; wrap spawned work in [`TraceId::scope`] again.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header used to echo (and optionally accept) the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// Per-request correlation identifier.
///
/// # Examples
/// ```
/// use discovery_backend::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id = TraceId::generate();
/// let seen = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Accept an upstream identifier when it is a well-formed UUID, otherwise
    /// mint a new one.
    #[must_use]
    pub fn from_header_or_generate(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Identifier of the enclosing request, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` installed as the current identifier.
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn current_is_none_outside_a_scope() {
        assert!(TraceId::current().is_none());
    }

    #[tokio::test]
    async fn nested_scopes_shadow_the_outer_identifier() {
        let outer = TraceId::generate();
        let inner = TraceId::generate();
        let seen = TraceId::scope(outer, async move {
            TraceId::scope(inner, async { TraceId::current() }).await
        })
        .await;
        assert_eq!(seen, Some(inner));
    }

    #[rstest]
    #[case(Some("00000000-0000-0000-0000-000000000001"), true)]
    #[case(Some("  00000000-0000-0000-0000-000000000001 "), true)]
    #[case(Some("not-a-uuid"), false)]
    #[case(None, false)]
    fn upstream_identifiers_are_reused_only_when_valid(
        #[case] raw: Option<&str>,
        #[case] reused: bool,
    ) {
        let id = TraceId::from_header_or_generate(raw);
        let expected = "00000000-0000-0000-0000-000000000001";
        assert_eq!(id.to_string() == expected, reused);
    }
}
