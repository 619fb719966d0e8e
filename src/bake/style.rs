//! Inline styling of markdown cells.
//!
//! Every markdown cell opens with `<div class="...">`. The class picks a CSS
//! string from the [`StyleTable`] and the opening tag is rewritten to carry it
//! as a `style` attribute, so `<div class="exercise">` becomes
//! `<div class="exercise" style="...">`.

use std::sync::LazyLock;

use regex::Regex;

use super::html::{Tag, parse_opening_tag};
use crate::config::StyleTable;

static OPENING_DIV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<div(?:\s[^>]*)?>").expect("opening div pattern"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("markdown cell must start with a <div class=...> tag (found {})", describe_outer(.outer))]
    MissingClassAttribute { outer: Option<String> },

    #[error("unknown class in markdown cell: {0}")]
    UnknownClass(String),

    #[error("markdown cell opening line must start with <div class=\"...\">: {0:?}")]
    MalformedOpeningTag(String),
}

fn describe_outer(outer: &Option<String>) -> String {
    match outer {
        Some(name) if name == "div" => "<div> without a class".to_string(),
        Some(name) => format!("<{name}>"),
        None => "no tags".to_string(),
    }
}

/// Class of a markdown cell, from the outer tag reported by
/// [`validate_tags`](super::html::validate_tags).
pub fn outer_class(outer: Option<&Tag>) -> Result<&str, StyleError> {
    match outer {
        Some(tag) if tag.name == "div" => tag.attr("class").ok_or(StyleError::MissingClassAttribute {
            outer: Some(tag.name.clone()),
        }),
        other => Err(StyleError::MissingClassAttribute {
            outer: other.map(|tag| tag.name.clone()),
        }),
    }
}

/// Rewrites the opening `<div>` of a markdown cell to carry its class style.
pub struct StyleInjector<'a> {
    styles: &'a StyleTable,
}

impl<'a> StyleInjector<'a> {
    pub fn new(styles: &'a StyleTable) -> Self {
        Self { styles }
    }

    /// Inject the style for the cell's class into its first line.
    ///
    /// Empty cells are left alone. On error the lines are not modified.
    /// Running this on an already styled cell changes nothing.
    pub fn inject(&self, lines: &mut [String]) -> Result<(), StyleError> {
        let Some(first) = lines.first_mut() else {
            return Ok(());
        };
        let styled = self.style_line(first)?;
        *first = styled;
        Ok(())
    }

    /// Return `line` with its opening `<div>` replaced by a styled one.
    pub fn style_line(&self, line: &str) -> Result<String, StyleError> {
        let opening = OPENING_DIV
            .find(line)
            .ok_or_else(|| StyleError::MalformedOpeningTag(first_chars(line)))?;
        let tag = parse_opening_tag(opening.as_str())
            .ok_or_else(|| StyleError::MalformedOpeningTag(first_chars(line)))?;

        let class = tag.attr("class").ok_or(StyleError::MissingClassAttribute {
            outer: Some(tag.name.clone()),
        })?;
        let style = self
            .styles
            .get(class)
            .ok_or_else(|| StyleError::UnknownClass(class.to_string()))?;

        let mut styled = format!("<div class={}", quote(class));
        for (key, value) in &tag.attrs {
            if key == "class" || key == "style" {
                continue;
            }
            styled.push(' ');
            styled.push_str(key);
            if !value.is_empty() {
                styled.push('=');
                styled.push_str(&quote(value));
            }
        }
        styled.push_str(&format!(" style={}>", quote(style)));
        styled.push_str(&line[opening.end()..]);
        Ok(styled)
    }
}

fn quote(value: &str) -> String {
    if value.contains('"') {
        format!("'{value}'")
    } else {
        format!("\"{value}\"")
    }
}

fn first_chars(line: &str) -> String {
    line.trim_end().chars().take(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::html::validate_tags;
    use proptest::prelude::*;

    fn lines(text: &str) -> Vec<String> {
        crate::bake::notebook::split_lines(text)
    }

    #[test]
    fn test_injects_exercise_style() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        let mut cell = lines("<div class=\"exercise\">\n**Exercise:** do it\n</div>");
        injector.inject(&mut cell).unwrap();

        let expected = format!(
            "<div class=\"exercise\" style=\"{}\">\n",
            styles.get("exercise").unwrap()
        );
        assert_eq!(cell[0], expected);
        assert_eq!(cell[1], "**Exercise:** do it\n");
    }

    #[test]
    fn test_keeps_rest_of_first_line_and_other_attributes() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        let line = injector
            .style_line("<div id=\"intro\" class=default>Hello <b>there</b></div>")
            .unwrap();
        assert!(line.starts_with("<div class=\"default\" id=\"intro\" style=\""));
        assert!(line.ends_with("\">Hello <b>there</b></div>"));
    }

    #[test]
    fn test_valueless_attribute_kept() {
        let styles = StyleTable::default();
        let line = StyleInjector::new(&styles)
            .style_line("<div hidden class=\"default\">x</div>")
            .unwrap();
        assert!(line.starts_with("<div class=\"default\" hidden style=\""));
    }

    #[test]
    fn test_idempotent() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        let mut once = lines("<div class=\"default\">\nText\n</div>");
        injector.inject(&mut once).unwrap();
        let mut twice = once.clone();
        injector.inject(&mut twice).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice[0].matches("style=").count(), 1);
    }

    #[test]
    fn test_unknown_class_leaves_cell_untouched() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        let mut cell = lines("<div class=\"mystery\">x</div>");
        let before = cell.clone();
        let err = injector.inject(&mut cell).unwrap_err();
        assert_eq!(err, StyleError::UnknownClass("mystery".to_string()));
        assert_eq!(cell, before);
    }

    #[test]
    fn test_malformed_opening_tag() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        for text in ["# Title\n<div class=\"default\"></div>", "<divider class=\"default\">", " <div class=\"default\">"] {
            let mut cell = lines(text);
            assert!(matches!(
                injector.inject(&mut cell),
                Err(StyleError::MalformedOpeningTag(_))
            ));
        }
    }

    #[test]
    fn test_missing_class_on_div() {
        let styles = StyleTable::default();
        let injector = StyleInjector::new(&styles);
        let mut cell = lines("<div id=\"x\">text</div>");
        assert_eq!(
            injector.inject(&mut cell),
            Err(StyleError::MissingClassAttribute {
                outer: Some("div".to_string())
            })
        );
    }

    #[test]
    fn test_empty_cell_is_noop() {
        let styles = StyleTable::default();
        let mut cell: Vec<String> = Vec::new();
        StyleInjector::new(&styles).inject(&mut cell).unwrap();
        assert!(cell.is_empty());
    }

    #[test]
    fn test_outer_class() {
        let tag = validate_tags("<div class=\"exercise\">x</div>").unwrap();
        assert_eq!(outer_class(tag.as_ref()), Ok("exercise"));

        let tag = validate_tags("<span class=\"exercise\">x</span>").unwrap();
        assert_eq!(
            outer_class(tag.as_ref()),
            Err(StyleError::MissingClassAttribute {
                outer: Some("span".to_string())
            })
        );

        assert_eq!(
            outer_class(None),
            Err(StyleError::MissingClassAttribute { outer: None })
        );
    }

    proptest! {
        #[test]
        fn prop_inject_twice_equals_once(
            class in prop::sample::select(vec!["default", "exercise"]),
            rest in "[a-zA-Z <>/=\"]{0,30}",
            tail in "[a-z\n ]{0,20}",
        ) {
            let styles = StyleTable::default();
            let injector = StyleInjector::new(&styles);
            let mut once = vec![format!("<div class=\"{class}\">{rest}\n"), tail];
            injector.inject(&mut once).unwrap();
            let mut twice = once.clone();
            injector.inject(&mut twice).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_unknown_class_fails_unmodified(class in "[a-z]{1,10}") {
            let styles = StyleTable::default();
            prop_assume!(!styles.contains(&class));
            let injector = StyleInjector::new(&styles);
            let mut cell = vec![format!("<div class=\"{class}\">body</div>")];
            let before = cell.clone();
            prop_assert_eq!(injector.inject(&mut cell), Err(StyleError::UnknownClass(class)));
            prop_assert_eq!(cell, before);
        }
    }
}
