use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

/// Code cell highlighter for the built-in renderer (autumnus, tree-sitter based).
pub struct SyntaxHighlighter {
    theme_name: String,
}

impl SyntaxHighlighter {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight a code cell, emitting HTML with CSS classes.
    /// Falls back to an escaped `<pre><code>` when the kernel language is unknown.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let lang = Language::guess(language, code);
        if matches!(lang, Language::PlainText) {
            return plain_code_block(code, language);
        }

        let Ok(formatter) = HtmlLinkedBuilder::new().source(code).lang(lang).build() else {
            return plain_code_block(code, language);
        };

        let mut output: Vec<u8> = Vec::new();
        if formatter.format(&mut output).is_err() {
            return plain_code_block(code, language);
        }
        String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
    }

    /// Stylesheet for the configured theme, if the theme exists.
    pub fn css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false))
    }
}

fn plain_code_block(code: &str, language: &str) -> String {
    format!(
        "<pre><code class=\"language-{}\">{}</code></pre>",
        html_escape(language),
        html_escape(code)
    )
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_python() {
        let highlighter = SyntaxHighlighter::new("dracula");
        let result = highlighter.highlight("def f(x):\n    return x + 1\n", "python");
        assert!(result.contains("<pre"));
        assert!(result.contains("</pre>"));
    }

    #[test]
    fn test_plain_code_block_is_escaped() {
        assert_eq!(
            plain_code_block("a < b", "text"),
            "<pre><code class=\"language-text\">a &lt; b</code></pre>"
        );
    }

    #[test]
    fn test_unknown_language_is_escaped() {
        let highlighter = SyntaxHighlighter::new("dracula");
        let result = highlighter.highlight("a < b", "no_such_language_xyz");
        assert!(result.starts_with("<pre"));
        assert!(result.contains("&lt;"));
        assert!(!result.contains("a < b"));
    }

    #[test]
    fn test_theme_css() {
        assert!(SyntaxHighlighter::new("dracula").css().is_some_and(|css| !css.is_empty()));
        assert!(SyntaxHighlighter::new("no-such-theme").css().is_none());
    }
}
