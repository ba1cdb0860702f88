//! HTML subtree to Markdown conversion
//!
//! Fixed style policy: ATX headings, dash bullets, fenced code blocks
//! with no language annotation, `[text](url)` links. Images, scripts
//! and styles are stripped entirely. Conversion is a pure function of
//! the parsed tree; no network or filesystem access.

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

/// Tags whose subtrees are dropped wholesale
const SKIP_TAGS: &[&str] = &["script", "style", "img", "noscript", "iframe", "svg", "head"];

/// Block-level containers that only contribute paragraph breaks
const BLOCK_TAGS: &[&str] = &[
    "div",
    "section",
    "article",
    "main",
    "aside",
    "figure",
    "figcaption",
    "body",
];

#[derive(Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(usize),
}

#[derive(Default)]
struct RenderState {
    lists: Vec<ListKind>,
    in_pre: bool,
}

/// Convert the subtree rooted at `root` into markdown text
///
/// Returns an empty string if the node id no longer resolves (e.g. the
/// subtree was detached after extraction).
pub fn convert(document: &Html, root: NodeId) -> String {
    let mut out = String::new();
    if let Some(node) = document.tree.get(root) {
        let mut state = RenderState::default();
        render(node, &mut out, &mut state);
    }
    normalize_blank_lines(&out)
}

fn render(node: NodeRef<'_, Node>, out: &mut String, state: &mut RenderState) {
    match node.value() {
        Node::Text(text) => {
            if state.in_pre {
                out.push_str(&text);
            } else {
                push_collapsed(out, &text);
            }
        }
        Node::Element(element) => {
            let name = element.name();
            if SKIP_TAGS.contains(&name) {
                return;
            }
            render_element(node, name, out, state);
        }
        // Comments, doctypes and processing instructions contribute nothing
        Node::Document | Node::Fragment => render_children(node, out, state),
        _ => {}
    }
}

fn render_element(node: NodeRef<'_, Node>, name: &str, out: &mut String, state: &mut RenderState) {
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            out.push_str("\n\n");
            for _ in 0..level {
                out.push('#');
            }
            out.push(' ');
            render_children(node, out, state);
            out.push_str("\n\n");
        }
        "p" => {
            out.push_str("\n\n");
            render_children(node, out, state);
            out.push_str("\n\n");
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("\n\n---\n\n"),
        "ul" => {
            state.lists.push(ListKind::Unordered);
            render_children(node, out, state);
            state.lists.pop();
            if state.lists.is_empty() {
                out.push('\n');
            }
        }
        "ol" => {
            state.lists.push(ListKind::Ordered(0));
            render_children(node, out, state);
            state.lists.pop();
            if state.lists.is_empty() {
                out.push('\n');
            }
        }
        "li" => {
            out.push('\n');
            let depth = state.lists.len();
            for _ in 0..depth.saturating_sub(1) {
                out.push_str("  ");
            }
            match state.lists.last_mut() {
                Some(ListKind::Ordered(n)) => {
                    *n += 1;
                    out.push_str(&format!("{}. ", n));
                }
                _ => out.push_str("- "),
            }
            render_children(node, out, state);
        }
        "strong" | "b" => {
            out.push_str("**");
            render_children(node, out, state);
            out.push_str("**");
        }
        "em" | "i" => {
            out.push('*');
            render_children(node, out, state);
            out.push('*');
        }
        "pre" => {
            out.push_str("\n\n```\n");
            state.in_pre = true;
            render_children(node, out, state);
            state.in_pre = false;
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        "code" => {
            if state.in_pre {
                render_children(node, out, state);
            } else {
                out.push('`');
                render_children(node, out, state);
                out.push('`');
            }
        }
        "blockquote" => {
            let inner = render_to_string(node, state);
            out.push_str("\n\n");
            for line in inner.trim().lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        "a" => {
            let text = render_to_string(node, state);
            let text = text.trim();
            let href = node
                .value()
                .as_element()
                .and_then(|el| el.attr("href"))
                .unwrap_or("");
            if text.is_empty() {
                // Anchor with no visible text contributes nothing
            } else if href.is_empty() || href.starts_with('#') {
                out.push_str(text);
            } else {
                out.push_str(&format!("[{}]({})", text, href));
            }
        }
        "tr" => {
            render_children(node, out, state);
            out.push('\n');
        }
        "td" | "th" => {
            render_children(node, out, state);
            out.push_str(" | ");
        }
        _ if BLOCK_TAGS.contains(&name) => {
            render_children(node, out, state);
            out.push_str("\n\n");
        }
        _ => render_children(node, out, state),
    }
}

fn render_children(node: NodeRef<'_, Node>, out: &mut String, state: &mut RenderState) {
    for child in node.children() {
        render(child, out, state);
    }
}

/// Render a node's children into a standalone buffer
fn render_to_string(node: NodeRef<'_, Node>, state: &mut RenderState) -> String {
    let mut buf = String::new();
    render_children(node, &mut buf, state);
    buf
}

/// Append text with internal whitespace runs collapsed to single spaces
fn push_collapsed(out: &mut String, text: &str) {
    let mut last_was_space = out.ends_with([' ', '\n']);
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
}

/// Collapse runs of blank lines down to exactly one blank line
///
/// Trailing whitespace is stripped per line and the result is trimmed,
/// so applying this twice is the same as applying it once.
pub fn normalize_blank_lines(s: &str) -> String {
    let mut result = String::new();
    let mut pending_blank = false;
    let mut seen_content = false;

    for line in s.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = seen_content;
            continue;
        }
        if pending_blank {
            result.push_str("\n\n");
            pending_blank = false;
        } else if seen_content {
            result.push('\n');
        }
        result.push_str(line);
        seen_content = true;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn convert_page(html: &str) -> String {
        let mut doc = Html::parse_document(html);
        let extraction = extract(&mut doc);
        convert(&doc, extraction.body.expect("page should have content"))
    }

    #[test]
    fn test_atx_headings() {
        let md = convert_page("<body><main><h1>Title</h1><h3>Sub</h3></main></body>");
        assert!(md.contains("# Title"));
        assert!(md.contains("### Sub"));
    }

    #[test]
    fn test_dash_bullets() {
        let md = convert_page("<body><main><ul><li>One</li><li>Two</li></ul></main></body>");
        assert!(md.contains("- One"));
        assert!(md.contains("- Two"));
    }

    #[test]
    fn test_ordered_list_numbering() {
        let md = convert_page("<body><main><ol><li>First</li><li>Second</li></ol></main></body>");
        assert!(md.contains("1. First"));
        assert!(md.contains("2. Second"));
    }

    #[test]
    fn test_nested_list_indent() {
        let md = convert_page(
            "<body><main><ul><li>Outer<ul><li>Inner</li></ul></li></ul></main></body>",
        );
        assert!(md.contains("- Outer"));
        assert!(md.contains("  - Inner"));
    }

    #[test]
    fn test_emphasis() {
        let md = convert_page("<body><main><p><strong>bold</strong> and <em>it</em></p></main></body>");
        assert!(md.contains("**bold**"));
        assert!(md.contains("*it*"));
    }

    #[test]
    fn test_code_block_without_language() {
        let md = convert_page("<body><main><pre><code>let x = 1;</code></pre></main></body>");
        assert!(md.contains("```\nlet x = 1;\n```"));
        assert!(!md.contains("```rust"));
    }

    #[test]
    fn test_inline_code() {
        let md = convert_page("<body><main><p>call <code>run()</code> now</p></main></body>");
        assert!(md.contains("`run()`"));
    }

    #[test]
    fn test_links() {
        let md = convert_page(
            r#"<body><main><p><a href="https://example.com/guide">the guide</a></p></main></body>"#,
        );
        assert!(md.contains("[the guide](https://example.com/guide)"));
    }

    #[test]
    fn test_fragment_link_keeps_text_only() {
        let md = convert_page(r##"<body><main><p><a href="#top">back</a></p></main></body>"##);
        assert!(md.contains("back"));
        assert!(!md.contains("(#top)"));
    }

    #[test]
    fn test_images_and_scripts_stripped() {
        let md = convert_page(
            r#"<body><main><p>before</p><img src="x.png" alt="pic"><script>alert(1)</script><style>.a{}</style><p>after</p></main></body>"#,
        );
        assert!(md.contains("before"));
        assert!(md.contains("after"));
        assert!(!md.contains("x.png"));
        assert!(!md.contains("alert"));
        assert!(!md.contains(".a{}"));
    }

    #[test]
    fn test_blockquote() {
        let md = convert_page("<body><main><blockquote>wise words</blockquote></main></body>");
        assert!(md.contains("> wise words"));
    }

    #[test]
    fn test_normalize_collapses_blank_runs() {
        assert_eq!(normalize_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_blank_lines("a\nb"), "a\nb");
        assert_eq!(normalize_blank_lines("\n\na\n\n"), "a");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = "one\n\n\n\ntwo   \n\n\n\n\nthree\n\n";
        let once = normalize_blank_lines(input);
        let twice = normalize_blank_lines(&once);
        assert_eq!(once, twice);
    }
}
