use crate::context;
use crate::result::{BgSizeError, BgSizeErrorKind, BgSizeResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tuning knobs of an [`ImageSizeResolver`](crate::resolver::ImageSizeResolver).
///
/// ```ron
/// (
///     load_timeout_ms: Some(5000),
///     discard_stale_cycles: true,
///     thread_name_prefix: "bgsize",
/// )
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound for a whole cycle's join; `None` waits forever
    pub load_timeout_ms: Option<u64>,
    /// Drop results of cycles superseded by a newer one instead of publishing them
    pub discard_stale_cycles: bool,
    pub thread_name_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            load_timeout_ms: None,
            discard_stale_cycles: true,
            thread_name_prefix: "bgsize".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn from_ron_str(source: &str) -> BgSizeResult<Self> {
        let config: ResolverConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_file<P: AsRef<Path>>(path: P) -> BgSizeResult<Self> {
        let path = path.as_ref();
        context!("read resolver config from '{}'", path.display() => {
            std::fs::read_to_string(path)
                .map_err(BgSizeError::from)
                .and_then(|source| Self::from_ron_str(&source))
        })
    }

    /// Sub-millisecond timeouts are rounded up to one millisecond.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.load_timeout_ms = Some(millis.max(1));
        self
    }

    pub fn with_discard_stale_cycles(mut self, discard_stale_cycles: bool) -> Self {
        self.discard_stale_cycles = discard_stale_cycles;
        self
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> BgSizeResult<()> {
        if self.load_timeout_ms == Some(0) {
            return Err(BgSizeError::new(BgSizeErrorKind::Config(
                "load_timeout_ms must be greater than zero".to_string(),
            )));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(BgSizeError::new(BgSizeErrorKind::Config(
                "thread_name_prefix must not be empty".to_string(),
            )));
        }
        Ok(())
    }
}
