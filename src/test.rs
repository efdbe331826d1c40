use crate::err;
use crate::loader::ImageLoader;
use crate::result::BgSizeResult;
use crate::types::ImageSize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Image loader for tests: every image has the same default size unless
/// configured otherwise, and loads can be delayed or made to fail per URL.
pub struct FakeImageLoader {
    default_size: ImageSize,
    sizes: HashMap<String, ImageSize>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl FakeImageLoader {
    pub fn new(default_size: ImageSize) -> Self {
        FakeImageLoader {
            default_size,
            sizes: HashMap::new(),
            delays: HashMap::new(),
            failing: vec![],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_size(mut self, src: &str, size: ImageSize) -> Self {
        self.sizes.insert(src.to_string(), size);
        self
    }

    pub fn with_delay(mut self, src: &str, delay: Duration) -> Self {
        self.delays.insert(src.to_string(), delay);
        self
    }

    pub fn failing(mut self, src: &str) -> Self {
        self.failing.push(src.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageLoader for FakeImageLoader {
    fn load(&self, src: &str) -> BgSizeResult<ImageSize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(src) {
            thread::sleep(*delay);
        }
        if self.failing.iter().any(|failing| failing == src) {
            return Err(err!("decode failed for {}", src));
        }
        Ok(self.sizes.get(src).copied().unwrap_or(self.default_size))
    }
}
