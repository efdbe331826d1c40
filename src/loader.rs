use crate::resource::Resource;
use crate::result::{BgSizeError, BgSizeErrorKind, BgSizeResult};
use crate::types::ImageSize;
use image::ImageReader;
use std::path::{Path, PathBuf};

/// Capability to determine the natural size of an image given its URL.
///
/// `load` blocks until the size is known. Resolvers call it from a dedicated
/// worker thread per image, so implementations must be shareable across threads.
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, src: &str) -> BgSizeResult<ImageSize>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str) -> BgSizeResult<ImageSize> + Send + Sync + 'static,
{
    fn load(&self, src: &str) -> BgSizeResult<ImageSize> {
        self(src)
    }
}

/// Loads images from the local file system, reading only the image header.
///
/// Relative sources are resolved against the base directory, `file://` URLs
/// are accepted, any other scheme is rejected.
#[derive(Clone, Debug)]
pub struct FileImageLoader {
    base_dir: PathBuf,
}

impl FileImageLoader {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        FileImageLoader {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve_path(&self, src: &str) -> BgSizeResult<PathBuf> {
        if let Some(path) = src.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if let Some(scheme) = url_scheme(src) {
            return Err(BgSizeError::new(BgSizeErrorKind::UnsupportedScheme(
                scheme.to_string(),
            )));
        }
        Ok(self.base_dir.join(src))
    }

    fn read_dimensions(&self, src: &str) -> BgSizeResult<ImageSize> {
        let resource = Resource::from_path(self.resolve_path(src)?);
        let reader = ImageReader::new(resource.buf_reader()?).with_guessed_format()?;
        let (width, height) = reader.into_dimensions()?;
        Ok(ImageSize::new(width, height))
    }
}

impl Default for FileImageLoader {
    fn default() -> Self {
        FileImageLoader::new(".")
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, src: &str) -> BgSizeResult<ImageSize> {
        self.read_dimensions(src).map_err(|error| {
            if matches!(error.kind(), BgSizeErrorKind::UnsupportedScheme(_)) {
                return error;
            }
            let reason = error.kind().to_string();
            BgSizeError(error.0.change_context(BgSizeErrorKind::ImageLoad {
                src: src.to_string(),
                reason,
            }))
        })
    }
}

// A scheme needs at least two characters so that Windows drive letters stay paths.
fn url_scheme(src: &str) -> Option<&str> {
    let (scheme, _) = src.split_once(':')?;
    let mut chars = scheme.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_with_letter
        && scheme.len() > 1
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn write_png(name: &str, width: u32, height: u32) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bgsize-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_relative_png() {
        let path = write_png("relative.png", 12, 7);
        let loader = FileImageLoader::new(path.parent().unwrap());
        assert_eq!(loader.load("relative.png").unwrap(), ImageSize::new(12, 7));
    }

    #[test]
    fn test_load_file_url() {
        let path = write_png("file-url.png", 3, 5);
        let loader = FileImageLoader::default();
        let src = format!("file://{}", path.display());
        assert_eq!(loader.load(&src).unwrap(), ImageSize::new(3, 5));
    }

    #[test]
    fn test_missing_file_is_image_load_error() {
        let loader = FileImageLoader::new(std::env::temp_dir());
        let error = loader.load("bgsize-does-not-exist.png").unwrap_err();
        let BgSizeErrorKind::ImageLoad { src, .. } = error.kind() else {
            panic!("unexpected error kind: {:?}", error.kind());
        };
        assert_eq!(src, "bgsize-does-not-exist.png");
    }

    #[test]
    fn test_unsupported_scheme() {
        let loader = FileImageLoader::default();
        for src in ["https://test/file.png", "data:image/png;base64,AAAA"] {
            let error = loader.load(src).unwrap_err();
            assert!(
                matches!(error.kind(), BgSizeErrorKind::UnsupportedScheme(_)),
                "{src}"
            );
        }
    }

    #[test]
    fn test_url_scheme() {
        assert_eq!(url_scheme("https://test/file.png"), Some("https"));
        assert_eq!(url_scheme("data:image/png;base64,AAAA"), Some("data"));
        assert_eq!(url_scheme("C:\\images\\a.png"), None);
        assert_eq!(url_scheme("./foo/bar.png"), None);
        assert_eq!(url_scheme("foo/bar:baz.png"), None);
    }

    #[test]
    fn test_closure_loader() {
        let loader = |_src: &str| -> BgSizeResult<ImageSize> { Ok(ImageSize::new(200, 100)) };
        assert_eq!(ImageLoader::load(&loader, "x.png").unwrap(), ImageSize::new(200, 100));
    }
}
