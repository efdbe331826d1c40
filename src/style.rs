use crate::element::ElementHandle;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::trace;

/// Capability to read the computed `background-image` of an element.
///
/// Returns `None` if the element is unknown to the reader.
pub trait StyleReader: Send + Sync + 'static {
    fn background_image(&self, element: ElementHandle) -> Option<String>;
}

/// Computes `background-image` from per-element CSS declaration text,
/// e.g. `color: red; background: url(a.png) no-repeat`.
///
/// The last `background-image` declaration wins. Without one, the image
/// layers of the last `background` shorthand are used. Elements without any
/// background compute to `none`.
#[derive(Debug, Default)]
pub struct StyleSheet {
    declarations: RwLock<HashMap<ElementHandle, String>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_declarations<S: Into<String>>(&self, element: ElementHandle, declarations: S) {
        self.declarations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(element, declarations.into());
    }

    pub fn remove(&self, element: ElementHandle) {
        self.declarations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&element);
    }

    fn declarations_of(&self, element: ElementHandle) -> Option<String> {
        self.declarations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&element)
            .cloned()
    }
}

impl StyleReader for StyleSheet {
    fn background_image(&self, element: ElementHandle) -> Option<String> {
        let declarations = self.declarations_of(element)?;
        let computed = compute_background_image(&declarations);
        trace!("Computed background-image of {}: {}", element, computed);
        Some(computed)
    }
}

pub fn compute_background_image(declarations: &str) -> String {
    let mut longhand = None;
    let mut shorthand = None;
    for declaration in split_top_level(declarations, |c| c == ';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = strip_important(value.trim());
        match name.trim().to_ascii_lowercase().as_str() {
            "background-image" => longhand = Some(value),
            "background" => shorthand = Some(value),
            _ => {}
        }
    }
    if let Some(value) = longhand {
        return value.to_string();
    }
    shorthand
        .map(shorthand_image_layers)
        .unwrap_or_else(|| "none".to_string())
}

fn shorthand_image_layers(value: &str) -> String {
    let layers: Vec<&str> = split_top_level(value, |c| c == ',')
        .into_iter()
        .map(|layer| {
            split_top_level(layer, char::is_whitespace)
                .into_iter()
                .find(|token| is_image_token(token))
                .unwrap_or("none")
        })
        .collect();
    if layers.iter().all(|layer| *layer == "none") {
        return "none".to_string();
    }
    layers.join(", ")
}

fn is_image_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with("url(")
        || lower.starts_with("image-set(")
        || lower.starts_with("-webkit-image-set(")
        || (lower.ends_with(')') && lower.contains("gradient("))
}

fn strip_important(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    match lower.rfind("!important") {
        Some(index) if lower[index..].trim_end() == "!important" => value[..index].trim_end(),
        _ => value,
    }
}

/// Splits at separator characters outside of parentheses and quotes,
/// dropping empty pieces.
fn split_top_level(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_separator(c) => {
                pieces.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    fn test_compute(declarations: &str, expected: Expect) {
        expected.assert_eq(&compute_background_image(declarations));
    }

    macro_rules! test_compute {
        ($($name:ident, $input:expr, $expected:expr;)+) => {
            $(#[test]
            fn $name() {
                test_compute($input, $expected);
            })+
        };
    }

    test_compute!(
        longhand, "background-image: url(https://test/file.png)",
            expect!["url(https://test/file.png)"];
        longhand_quoted, r#"color: red; background-image: url("a.png"), url('b.png')"#,
            expect![[r#"url("a.png"), url('b.png')"#]];
        last_longhand_wins, "background-image: url(a.png); background-image: url(b.png)",
            expect!["url(b.png)"];
        longhand_beats_shorthand, "background-image: url(a.png); background: url(b.png) red",
            expect!["url(a.png)"];
        shorthand, "background: red url(a.png) no-repeat center",
            expect!["url(a.png)"];
        shorthand_layers, "background: url(a.png) no-repeat, linear-gradient(red, blue), #fff",
            expect!["url(a.png), linear-gradient(red, blue), none"];
        shorthand_without_image, "background: red",
            expect!["none"];
        no_background, "color: red",
            expect!["none"];
        important, "background-image: url(a.png) !important",
            expect!["url(a.png)"];
        data_url_with_semicolon, "background-image: url(data:image/png;base64,AAAA); color: red",
            expect!["url(data:image/png;base64,AAAA)"];
        uppercase_property, "BACKGROUND-IMAGE: url(a.png)",
            expect!["url(a.png)"];
    );

    #[test]
    fn test_style_sheet() {
        let style_sheet = StyleSheet::new();
        let element = ElementHandle::new(1);
        assert_eq!(style_sheet.background_image(element), None);
        style_sheet.set_declarations(element, "width: 10px");
        assert_eq!(style_sheet.background_image(element), Some("none".to_string()));
        style_sheet.set_declarations(element, "background-image: url(a.png)");
        assert_eq!(
            style_sheet.background_image(element),
            Some("url(a.png)".to_string())
        );
        style_sheet.remove(element);
        assert_eq!(style_sheet.background_image(element), None);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a: url('x;y'); b: c(d;e);;", |c| c == ';'),
            vec!["a: url('x;y')", "b: c(d;e)"]
        );
    }
}
