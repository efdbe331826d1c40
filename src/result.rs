use error_stack::Report;
use ron::de::SpannedError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BgSizeErrorKind {
    #[error("General Error: {0}")]
    General(String),
    #[error("Failed to load image '{src}': {reason}")]
    ImageLoad { src: String, reason: String },
    #[error("Unsupported image source scheme: '{0}'")]
    UnsupportedScheme(String),
    #[error("Timed out waiting for {pending} image load(s)")]
    Timeout { pending: usize },
    #[error("Configuration Error: {0}")]
    Config(String),
}

#[derive(Debug)]
pub struct BgSizeError(pub Report<BgSizeErrorKind>);

impl Display for BgSizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl BgSizeError {
    #[track_caller]
    pub fn new(error: BgSizeErrorKind) -> BgSizeError {
        BgSizeError(Report::new(error))
    }

    #[track_caller]
    pub fn change_context<S: Into<String>>(self, message: S) -> Self {
        Self(
            self.0
                .change_context(BgSizeErrorKind::General(message.into())),
        )
    }

    pub fn kind(&self) -> &BgSizeErrorKind {
        self.0.current_context()
    }
}

pub type BgSizeResult<T> = Result<T, BgSizeError>;

impl<T> From<T> for BgSizeError
where
    for<'a> &'a T: Into<BgSizeErrorKind>,
    T: Error + Send + Sync + 'static,
{
    #[track_caller]
    fn from(error: T) -> Self {
        let kind: BgSizeErrorKind = (&error).into();
        let report = Report::new(error);
        let report = report.change_context(kind);
        Self(report)
    }
}

impl From<&std::io::Error> for BgSizeErrorKind {
    #[track_caller]
    fn from(error: &std::io::Error) -> Self {
        Self::General(error.to_string())
    }
}

impl From<&image::ImageError> for BgSizeErrorKind {
    #[track_caller]
    fn from(error: &image::ImageError) -> Self {
        Self::General(format!("Image Error: {}", error))
    }
}

impl From<&regex_lite::Error> for BgSizeErrorKind {
    #[track_caller]
    fn from(error: &regex_lite::Error) -> Self {
        Self::General(error.to_string())
    }
}

impl From<&SpannedError> for BgSizeErrorKind {
    #[track_caller]
    fn from(error: &SpannedError) -> Self {
        Self::Config(format!("RON Error: {}", error))
    }
}

impl From<String> for BgSizeErrorKind {
    #[track_caller]
    fn from(error: String) -> Self {
        Self::General(error)
    }
}

impl From<&str> for BgSizeError {
    #[track_caller]
    fn from(error: &str) -> Self {
        Self(Report::new(BgSizeErrorKind::General(error.to_string())))
    }
}

#[macro_export]
macro_rules! bail {
    ($($args:tt)+) => {
        return Err($crate::result::BgSizeError::new($crate::result::BgSizeErrorKind::General(format!($($args)+).into())))
    }
}

#[macro_export]
macro_rules! err {
    ($($args:tt)+) => {
        $crate::result::BgSizeError::new($crate::result::BgSizeErrorKind::General(format!($($args)+).into()))
    };
}

#[macro_export]
macro_rules! context {
    ($fmt:expr $(, $($args:expr),+)? => $block:block) => {
        {
            $block
        }.map_err(|e: $crate::result::BgSizeError| e.change_context(format!(concat!("Failed to ",$fmt) $(, $($args)+)?)))
    };
}
pub use context;
