//! Lossy HTML → Markdown conversion for remote rich text.
//!
//! Canvas descriptions and page bodies are HTML fragments. They are parsed
//! into a DOM and walked once. The output keeps headings, emphasis, lists,
//! links and images readable in a Markdown editor; everything else collapses
//! to text. Entities are decoded by the parser.

use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Elements whose content is never shown.
const SKIPPED: &[&str] = &["script", "style", "head", "title", "noscript", "template"];

/// Elements that start and end a paragraph.
const BLOCKS: &[&str] = &[
    "p", "div", "ul", "ol", "table", "thead", "tbody", "tr", "blockquote", "section",
    "article", "pre", "hr", "header", "footer", "figure",
];

/// Convert an HTML fragment to Markdown. Empty or whitespace-only input
/// yields an empty string.
pub fn html_to_markdown(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    walk_children(fragment.root_element(), &mut out);
    tidy(&out)
}

fn walk_children(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    walk_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn walk_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    match name {
        n if SKIPPED.contains(&n) => {}
        "a" => match el.value().attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => {
                let label = inline(el);
                if label.is_empty() {
                    out.push_str(&format!("<{href}>"));
                } else {
                    out.push_str(&format!("[{label}]({href})"));
                }
            }
            _ => walk_children(el, out),
        },
        "img" => {
            if let Some(src) = el.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                let alt = el.value().attr("alt").unwrap_or_default().trim();
                out.push_str(&format!("![{alt}]({src})"));
            }
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = usize::from(name.as_bytes()[1] - b'0');
            let text = inline(el);
            if !text.is_empty() {
                out.push_str(&format!("\n\n{} {text}\n\n", "#".repeat(level)));
            }
        }
        "strong" | "b" => wrap_inline(el, "**", out),
        "em" | "i" => wrap_inline(el, "*", out),
        "code" => wrap_inline(el, "`", out),
        "li" => {
            out.push_str("\n- ");
            walk_children(el, out);
        }
        "br" => out.push('\n'),
        "td" | "th" => {
            walk_children(el, out);
            out.push(' ');
        }
        n if BLOCKS.contains(&n) => {
            out.push_str("\n\n");
            walk_children(el, out);
            out.push_str("\n\n");
        }
        _ => walk_children(el, out),
    }
}

/// The element's content as one line of Markdown.
fn inline(el: ElementRef<'_>) -> String {
    let mut buf = String::new();
    walk_children(el, &mut buf);
    buf.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn wrap_inline(el: ElementRef<'_>, marker: &str, out: &mut String) {
    let text = inline(el);
    if !text.is_empty() {
        out.push_str(marker);
        out.push_str(&text);
        out.push_str(marker);
    }
}

/// Source whitespace, newlines included, is a single space.
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

/// Trim every line, collapse inner runs of spaces, keep at most one blank
/// line between paragraphs.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().map_or(true, String::is_empty) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(html_to_markdown(""), "");
        assert_eq!(html_to_markdown("  \n "), "");
    }

    #[test]
    fn paragraphs_and_emphasis() {
        let md = html_to_markdown("<p>Read <strong>chapter 3</strong> and <em>skim</em> 4.</p><p>Then rest.</p>");
        assert_eq!(md, "Read **chapter 3** and *skim* 4.\n\nThen rest.");
    }

    #[test]
    fn links_and_images() {
        let md = html_to_markdown(
            r#"<p>See <a href="https://example.edu/syllabus">the syllabus</a>.</p><img src="/img/a.png" alt="diagram">"#,
        );
        assert!(md.contains("[the syllabus](https://example.edu/syllabus)"), "{md}");
        assert!(md.contains("![diagram](/img/a.png)"), "{md}");
    }

    #[test]
    fn quotes_inside_href_are_kept() {
        let md = html_to_markdown(r#"<a href="https://x.edu/O'Brien/notes">notes</a>"#);
        assert_eq!(md, "[notes](https://x.edu/O'Brien/notes)");

        let md = html_to_markdown(r#"<a href='https://x.edu/q?say="hi"'>quote</a>"#);
        assert_eq!(md, r#"[quote](https://x.edu/q?say="hi")"#);
    }

    #[test]
    fn entity_in_href_is_decoded() {
        let md = html_to_markdown(r#"<a href="https://x.edu/a?b=1&amp;c=2">both</a>"#);
        assert_eq!(md, "[both](https://x.edu/a?b=1&c=2)");
    }

    #[test]
    fn headings_and_lists() {
        let md = html_to_markdown("<h2>Tasks</h2><ul><li>One</li><li>Two</li></ul>");
        assert_eq!(md, "## Tasks\n\n- One\n- Two");
    }

    #[test]
    fn scripts_dropped_and_entities_decoded() {
        let md = html_to_markdown("<script>alert(1)</script><p>A &amp; B &lt;3 &#169;&nbsp;2026</p>");
        assert_eq!(md, "A & B <3 © 2026");
    }

    #[test]
    fn raw_newlines_are_whitespace() {
        let md = html_to_markdown("<p>line one\n   continues</p>");
        assert_eq!(md, "line one continues");
    }

    #[test]
    fn unclosed_markup_still_converts() {
        let md = html_to_markdown("<p>Due <b>Friday<p>Bring a laptop");
        assert!(md.contains("Due **Friday**"), "{md}");
        assert!(md.contains("Bring a laptop"), "{md}");
    }
}
