use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Elements that never hold recipe content
const SKIPPED_ELEMENTS: [&str; 8] = [
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript",
];

static CONTENT_ROOTS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["main", "article", "body"]
        .iter()
        .map(|name| Selector::parse(name).expect("valid content selector"))
        .collect()
});

/// Readable text of a page for the extraction model.
///
/// Drops boilerplate elements, then takes the text of `<main>`, else
/// `<article>`, else `<body>`, one trimmed text node per line.
pub fn extract_page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = CONTENT_ROOTS
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .find(|element| !is_skipped(element))
        })
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if skipped {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            lines.push(text);
        }
    }

    lines.join("\n")
}

fn is_skipped(element: &ElementRef) -> bool {
    std::iter::once(**element)
        .chain(element.ancestors())
        .any(|node| {
            node.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        })
}
