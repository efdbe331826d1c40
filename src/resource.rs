use crate::result::BgSizeResult;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

#[derive(Debug)]
struct ResourceInner {
    path: PathBuf,
}

impl Resource {
    pub fn from_path<S: Into<PathBuf>>(path: S) -> Self {
        Self {
            inner: Arc::new(ResourceInner { path: path.into() }),
        }
    }

    pub fn buf_reader(&self) -> BgSizeResult<BufReader<File>> {
        debug!("Opening resource: '{}'", self.inner.path.display());
        Ok(BufReader::new(File::open(&self.inner.path)?))
    }
}
