//! Markdown to HTML rendering using pulldown-cmark.

use pulldown_cmark::{html, Options, Parser};

/// Extensions enabled for article bodies.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Render a markdown document to an HTML fragment.
///
/// The output is trusted: raw HTML in the source passes through untouched.
pub fn render(source: &str) -> String {
    let parser = Parser::new_ext(source, parser_options());
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_emphasis() {
        assert_eq!(render("Hello **world**"), "<p>Hello <strong>world</strong></p>\n");
    }

    #[test]
    fn renders_tables() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn renders_strikethrough_and_footnotes() {
        let html = render("~~gone~~ and a note[^1]\n\n[^1]: the note\n");
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("footnote-definition"));
    }

    #[test]
    fn passes_raw_html_through() {
        assert!(render("<div class=\"x\">hi</div>\n").contains("<div class=\"x\">hi</div>"));
    }
}
