//! Flattened, position-addressable view over a parsed HTML document.
//!
//! Every element is stored once, in document (pre-order) order, so "everything
//! after element E" is a plain index scan rather than a subtree walk.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Matches anchors that carry an `href`.
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));

/// Elements of a document in document order.
pub struct FlatDocument<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> FlatDocument<'a> {
    pub fn new(html: &'a Html) -> Self {
        let elements = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();

        Self { elements }
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<ElementRef<'a>> {
        self.elements.get(index).copied()
    }

    /// First element with the given tag name.
    pub fn first(&self, tag: &str) -> Option<ElementRef<'a>> {
        self.elements
            .iter()
            .find(|el| el.value().name() == tag)
            .copied()
    }

    /// Positions of every element with the given tag name.
    pub fn positions(&self, tag: &str) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.value().name() == tag)
            .map(|(i, _)| i)
            .collect()
    }

    /// Every element with the given tag positioned after `index`, anywhere in
    /// the document.
    pub fn following(&self, index: usize, tag: &str) -> Vec<ElementRef<'a>> {
        self.elements
            .iter()
            .skip(index + 1)
            .filter(|el| el.value().name() == tag)
            .copied()
            .collect()
    }

    /// Trimmed text of the nearest preceding sibling element, or empty.
    pub fn preceding_sibling_text(&self, index: usize) -> String {
        self.get(index)
            .and_then(|el| el.prev_siblings().find_map(ElementRef::wrap))
            .map(|sibling| element_text(&sibling).trim().to_string())
            .unwrap_or_default()
    }
}

/// All descendant text of an element, concatenated.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

/// The `href` of the first link inside an element.
pub fn first_link(el: &ElementRef<'_>) -> Option<String> {
    el.select(&LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(String::from)
}

/// `(href, text)` for every link in the document, in order.
pub fn links(html: &Html) -> Vec<(String, String)> {
    html.select(&LINK_SEL)
        .filter_map(|a| {
            a.value()
                .attr("href")
                .map(|href| (href.to_string(), element_text(&a)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
        <h3>First</h3>
        <table id="t1"><tr><td>r1</td></tr><tr><td><a href="r2.html">r2</a></td></tr></table>
        <p>Second</p>
        <table id="t2"><tr><td>r3</td></tr></table>
    </body></html>"#;

    #[test]
    fn positions_in_document_order() {
        let html = Html::parse_document(HTML);
        let doc = FlatDocument::new(&html);

        let tables = doc.positions("table");
        assert_eq!(tables.len(), 2);
        assert!(tables[0] < tables[1]);
        assert_eq!(doc.get(tables[0]).unwrap().value().attr("id"), Some("t1"));
    }

    #[test]
    fn following_spans_past_the_subtree() {
        let html = Html::parse_document(HTML);
        let doc = FlatDocument::new(&html);
        let tables = doc.positions("table");

        let after_first: Vec<String> = doc
            .following(tables[0], "tr")
            .iter()
            .map(|tr| element_text(tr).trim().to_string())
            .collect();
        assert_eq!(after_first, vec!["r1", "r2", "r3"]);

        assert_eq!(doc.following(tables[1], "tr").len(), 1);
    }

    #[test]
    fn preceding_sibling_skips_text_nodes() {
        let html = Html::parse_document(HTML);
        let doc = FlatDocument::new(&html);
        let tables = doc.positions("table");

        assert_eq!(doc.preceding_sibling_text(tables[0]), "First");
        assert_eq!(doc.preceding_sibling_text(tables[1]), "Second");
    }

    #[test]
    fn preceding_sibling_missing_is_empty() {
        let html = Html::parse_document("<html><body><table><tr><td>x</td></tr></table></body></html>");
        let doc = FlatDocument::new(&html);
        let tables = doc.positions("table");
        assert_eq!(doc.preceding_sibling_text(tables[0]), "");
    }

    #[test]
    fn first_link_in_row() {
        let html = Html::parse_document(HTML);
        let doc = FlatDocument::new(&html);
        let rows = doc.following(0, "tr");

        assert_eq!(first_link(&rows[0]), None);
        assert_eq!(first_link(&rows[1]), Some("r2.html".into()));
    }

    #[test]
    fn collects_links() {
        let html = Html::parse_document(HTML);
        assert_eq!(links(&html), vec![("r2.html".to_string(), "r2".to_string())]);
    }
}
