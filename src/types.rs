use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Natural pixel dimensions of an image
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        ImageSize { width, height }
    }
}

impl Display for ImageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A resolved image: its natural dimensions and the URL it was requested with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub src: String,
}

impl ImageDescriptor {
    pub fn new<S: Into<String>>(src: S, size: ImageSize) -> Self {
        ImageDescriptor {
            width: size.width,
            height: size.height,
            src: src.into(),
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

/// Value published by a resolution cycle.
///
/// "Nothing resolved yet" is represented by `Option::None` around this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedImages {
    Single(ImageDescriptor),
    Multiple(Vec<ImageDescriptor>),
    Failed { failed: String },
}

impl ResolvedImages {
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        ResolvedImages::Failed {
            failed: reason.into(),
        }
    }

    pub fn descriptors(&self) -> &[ImageDescriptor] {
        match self {
            ResolvedImages::Single(descriptor) => std::slice::from_ref(descriptor),
            ResolvedImages::Multiple(descriptors) => descriptors,
            ResolvedImages::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResolvedImages::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_single() {
        let images = ResolvedImages::Single(ImageDescriptor::new(
            "https://test/file.png",
            ImageSize::new(200, 200),
        ));
        assert_eq!(
            serde_json::to_string(&images).unwrap(),
            r#"{"width":200,"height":200,"src":"https://test/file.png"}"#
        );
    }

    #[test]
    fn test_serialize_multiple() {
        let images = ResolvedImages::Multiple(vec![
            ImageDescriptor::new("./foo/bar.png", ImageSize::new(200, 100)),
            ImageDescriptor::new("./one/two.svg", ImageSize::new(200, 100)),
        ]);
        assert_eq!(
            serde_json::to_string(&images).unwrap(),
            r#"[{"width":200,"height":100,"src":"./foo/bar.png"},{"width":200,"height":100,"src":"./one/two.svg"}]"#
        );
    }

    #[test]
    fn test_descriptors() {
        let single = ResolvedImages::Single(ImageDescriptor::new("a.png", ImageSize::new(1, 2)));
        assert_eq!(single.descriptors().len(), 1);
        assert_eq!(single.descriptors()[0].size().to_string(), "1x2");
        assert!(ResolvedImages::failed("nope").descriptors().is_empty());
        assert!(ResolvedImages::failed("nope").is_failed());
    }
}
