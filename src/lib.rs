//! Resolves the natural pixel size of images, given as URLs or taken from an
//! element's computed `background-image`.
pub mod config;
pub mod element;
pub mod loader;
pub mod logging;
pub mod mode;
pub mod resolver;
pub mod resource;
pub mod result;
pub mod style;
#[cfg(test)]
pub mod test;
pub mod types;
pub mod util;
