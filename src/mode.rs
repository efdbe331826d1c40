use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Operating mode of an [`ImageSizeResolver`](crate::resolver::ImageSizeResolver).
///
/// The `From` impls mirror the loosely typed input of a hook-style API:
/// `false` is [`Mode::Auto`], `true` is [`Mode::ManualTrigger`], a string is
/// [`Mode::SingleUrl`] and a list of strings is [`Mode::UrlList`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Derive URLs from the element's computed `background-image`
    #[default]
    Auto,
    /// Like `Auto`, but only when the returned trigger is invoked
    ManualTrigger,
    SingleUrl(String),
    UrlList(Vec<String>),
}

impl Mode {
    pub fn runs_automatically(&self) -> bool {
        !matches!(self, Mode::ManualTrigger)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::ManualTrigger => write!(f, "manual trigger"),
            Mode::SingleUrl(url) => write!(f, "url '{}'", url),
            Mode::UrlList(urls) => write!(f, "urls [{}]", urls.iter().join(", ")),
        }
    }
}

impl From<bool> for Mode {
    fn from(as_callback: bool) -> Self {
        if as_callback {
            Mode::ManualTrigger
        } else {
            Mode::Auto
        }
    }
}

impl From<&str> for Mode {
    fn from(url: &str) -> Self {
        Mode::SingleUrl(url.to_string())
    }
}

impl From<String> for Mode {
    fn from(url: String) -> Self {
        Mode::SingleUrl(url)
    }
}

impl From<Vec<String>> for Mode {
    fn from(urls: Vec<String>) -> Self {
        Mode::UrlList(urls)
    }
}

impl From<&[&str]> for Mode {
    fn from(urls: &[&str]) -> Self {
        Mode::UrlList(urls.iter().map(|url| url.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Mode {
    fn from(urls: [&str; N]) -> Self {
        Mode::UrlList(urls.iter().map(|url| url.to_string()).collect())
    }
}
