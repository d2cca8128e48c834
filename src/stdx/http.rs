use std::sync::Arc;

/// A desktop Chrome agent, sent when no other agent can be picked.
pub static DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// The site serves a reduced page (and sometimes a challenge) to agents that
// don't look like a desktop browser.
static USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// How the `User-Agent` header is chosen for each request.
#[derive(Debug, Clone, Default)]
pub(crate) enum UserAgent {
    /// Pick a random agent from the built-in pool for every request.
    #[default]
    Rotate,
    /// Always send the same agent.
    Fixed(Arc<str>),
}

impl UserAgent {
    pub(crate) fn pick(&self) -> &str {
        match self {
            Self::Rotate => USER_AGENTS
                .get(fastrand::usize(..USER_AGENTS.len()))
                .copied()
                .unwrap_or(DEFAULT_USER_AGENT),
            Self::Fixed(agent) => agent,
        }
    }
}
