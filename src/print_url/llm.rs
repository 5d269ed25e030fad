//! Helpers for asking a model where a page's print link is.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static PRINT_CUE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a, button, link, [onclick], [data-href], [data-url]")
        .expect("valid print cue selector")
});

/// Longest single element kept in an excerpt
const MAX_ELEMENT_CHARS: usize = 600;

/// Markup of the elements that mention "print", one per line, bounded by
/// `max_chars`. `None` when the page has no such element.
pub(crate) fn print_cue_excerpt(html: &str, max_chars: usize) -> Option<String> {
    let document = Html::parse_document(html);
    let mut excerpt = String::new();

    for element in document.select(&PRINT_CUE_SELECTOR) {
        let markup = element.html();
        if !markup.to_lowercase().contains("print") {
            continue;
        }

        let markup = truncate_chars(&markup, MAX_ELEMENT_CHARS);
        let needed = markup.chars().count() + 1;
        if excerpt.chars().count() + needed > max_chars {
            break;
        }
        excerpt.push_str(markup);
        excerpt.push('\n');
    }

    if excerpt.is_empty() {
        None
    } else {
        Some(excerpt)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Read the model's answer: a single URL, possibly relative, or `NONE`.
///
/// Answers that are not http(s) or that point back at the page itself are
/// treated as inconclusive.
pub(crate) fn parse_answer(answer: &str, page: &Url) -> Option<Url> {
    let line = answer.lines().map(str::trim).find(|line| !line.is_empty())?;
    let line = line
        .trim_start_matches("Print URL:")
        .trim()
        .trim_matches(|c: char| matches!(c, '<' | '>' | '"' | '\'' | '`'))
        .trim();

    if line.is_empty() || line.eq_ignore_ascii_case("none") || line.contains(char::is_whitespace) {
        return None;
    }

    let candidate = page.join(line).ok()?;
    if !matches!(candidate.scheme(), "http" | "https") || candidate == *page {
        return None;
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/recipes/soup/").unwrap()
    }

    #[test]
    fn test_excerpt_keeps_print_cues_only() {
        let html = r#"
            <html><body>
                <a href="/about">About</a>
                <a href="/wprm_print/soup" class="wprm-recipe-print">Print Recipe</a>
                <button onclick="window.print()">Print</button>
                <p>Some print text in a paragraph</p>
            </body></html>
        "#;

        let excerpt = print_cue_excerpt(html, 10_000).unwrap();
        assert!(excerpt.contains("/wprm_print/soup"));
        assert!(excerpt.contains("window.print()"));
        assert!(!excerpt.contains("/about"));
        assert!(!excerpt.contains("paragraph"));
    }

    #[test]
    fn test_excerpt_is_bounded() {
        let links: String = (0..200)
            .map(|i| format!(r#"<a href="/print/{}">Print</a>"#, i))
            .collect();
        let html = format!("<html><body>{}</body></html>", links);

        let excerpt = print_cue_excerpt(&html, 500).unwrap();
        assert!(excerpt.chars().count() <= 500);
        assert!(excerpt.contains("/print/0"));
    }

    #[test]
    fn test_excerpt_none_without_cues() {
        let html = r#"<html><body><a href="/about">About</a></body></html>"#;
        assert!(print_cue_excerpt(html, 10_000).is_none());
    }

    #[test]
    fn test_parse_absolute_answer() {
        assert_eq!(
            parse_answer("https://example.com/print/soup", &page()).unwrap().as_str(),
            "https://example.com/print/soup"
        );
    }

    #[test]
    fn test_parse_relative_answer() {
        assert_eq!(
            parse_answer("  /wprm_print/soup\n", &page()).unwrap().as_str(),
            "https://example.com/wprm_print/soup"
        );
        assert_eq!(
            parse_answer("Print URL: <https://example.com/p/1>", &page())
                .unwrap()
                .as_str(),
            "https://example.com/p/1"
        );
    }

    #[test]
    fn test_parse_inconclusive_answers() {
        assert!(parse_answer("NONE", &page()).is_none());
        assert!(parse_answer("none", &page()).is_none());
        assert!(parse_answer("", &page()).is_none());
        assert!(parse_answer("I could not find a print link.", &page()).is_none());
        assert!(parse_answer("javascript:window.print()", &page()).is_none());
        assert!(parse_answer("https://example.com/recipes/soup/", &page()).is_none());
    }
}
