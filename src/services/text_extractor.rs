use scraper::{ElementRef, Html, Node};

const SKIPPED_TAGS: [&str; 8] = [
    "script", "style", "noscript", "template", "svg", "head", "iframe", "button",
];

const BLOCK_TAGS: [&str; 28] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "p", "section", "td", "th", "tr",
];

/// Flattens an html document into readable text, one line per block element.
/// Returns None when the page has no visible text.
pub fn extract_readable_text(raw_html: &str) -> Option<String> {
    let document = Html::parse_document(raw_html);

    let mut lines = vec![];
    let mut current = String::new();
    collect_text(document.root_element(), &mut lines, &mut current);
    flush_line(&mut lines, &mut current);

    match lines.is_empty() {
        true => None,
        false => Some(lines.join("\n")),
    }
}

fn collect_text(element: ElementRef, lines: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(tag) => {
                let name = tag.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&name);

                if is_block {
                    flush_line(lines, current);
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, lines, current);
                }
                if is_block {
                    flush_line(lines, current);
                }
            }
            _ => {}
        }
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = current.split_whitespace().collect::<Vec<&str>>().join(" ");
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}
