//! Folder tree rendering for chat replies.
//!
//! Output is Telegram HTML: folder names are escaped, and folders with a
//! known id become links to the Drive web viewer.

use crate::folder::tree::{PathIdIndex, PathNode, PATH_SEPARATOR};
use crate::i18n::I18n;

/// Indentation added per tree level.
pub const INDENT: &str = "    ";

/// Marker placed before every folder name.
pub const BULLET: &str = "📁 ";

/// Viewer URL for a Drive folder.
pub fn folder_url(id: &str) -> String {
    format!("https://drive.google.com/drive/folders/{id}")
}

/// Render a folder tree as display lines.
///
/// Siblings are emitted in ascending name order, each node followed by its
/// children (depth-first, pre-order).
pub fn render(tree: &PathNode, index: &PathIdIndex) -> Vec<String> {
    let mut lines = Vec::new();
    render_children(tree, "", 0, index, &mut lines);
    lines
}

fn render_children(
    node: &PathNode,
    prefix: &str,
    depth: usize,
    index: &PathIdIndex,
    lines: &mut Vec<String>,
) {
    for (name, child) in node.children() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{name}")
        };

        lines.push(format!(
            "{}{}{}",
            INDENT.repeat(depth),
            BULLET,
            label(name, index.get(&path))
        ));

        render_children(child, &path, depth + 1, index, lines);
    }
}

fn label(name: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&folder_url(id)),
            escape_html(name)
        ),
        None => escape_html(name),
    }
}

/// Join rendered lines into the listing reply.
///
/// An empty listing yields the "no folders" text.
pub fn format_listing(lines: &[String], i18n: &I18n) -> String {
    if lines.is_empty() {
        return escape_html(i18n.t("listing.empty"));
    }

    let mut out = escape_html(i18n.t("listing.header"));
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::tree::{build, FolderEntry};

    fn render_pairs(pairs: &[(&str, &str)]) -> Vec<String> {
        let entries: Vec<_> = pairs.iter().map(|(p, id)| FolderEntry::new(*p, *id)).collect();
        let (tree, index) = build(&entries);
        render(&tree, &index)
    }

    fn link(name: &str, id: &str) -> String {
        format!("<a href=\"https://drive.google.com/drive/folders/{id}\">{name}</a>")
    }

    #[test]
    fn test_render_nested_example() {
        let lines = render_pairs(&[("A/B", "id1"), ("A/C", "id2"), ("A", "id3")]);

        assert_eq!(
            lines,
            vec![
                format!("📁 {}", link("A", "id3")),
                format!("    📁 {}", link("B", "id1")),
                format!("    📁 {}", link("C", "id2")),
            ]
        );
    }

    #[test]
    fn test_render_empty() {
        assert!(render_pairs(&[]).is_empty());
    }

    #[test]
    fn test_render_single_root_entry() {
        assert_eq!(render_pairs(&[("Docs", "d")]), vec![format!("📁 {}", link("Docs", "d"))]);
    }

    #[test]
    fn test_synthesized_segment_is_plain() {
        let lines = render_pairs(&[("X/Y", "y")]);
        assert_eq!(lines, vec!["📁 X".to_string(), format!("    📁 {}", link("Y", "y"))]);
    }

    #[test]
    fn test_siblings_sorted_at_every_depth() {
        let lines = render_pairs(&[
            ("zeta", "1"),
            ("alpha/mid", "2"),
            ("alpha/beta", "3"),
            ("Beta", "4"),
        ]);

        let names: Vec<_> = lines
            .iter()
            .map(|l| l.trim_start().trim_start_matches(BULLET).to_string())
            .collect();
        assert_eq!(
            names,
            vec![link("Beta", "4"), "alpha".to_string(), link("beta", "3"), link("mid", "2"), link("zeta", "1")]
        );
    }

    #[test]
    fn test_render_order_independent() {
        let pairs = [("a/b/c", "1"), ("a", "2"), ("d", "3"), ("a/e", "4")];
        let mut reversed = pairs;
        reversed.reverse();
        assert_eq!(render_pairs(&pairs), render_pairs(&reversed));
    }

    #[test]
    fn test_deep_indentation() {
        let lines = render_pairs(&[("a/b/c/d", "x")]);
        assert_eq!(lines[3], format!("{}📁 {}", INDENT.repeat(3), link("d", "x")));
    }

    #[test]
    fn test_names_are_escaped() {
        let lines = render_pairs(&[("R&D <old>", "i\"d")]);
        assert_eq!(
            lines,
            vec![
                "📁 <a href=\"https://drive.google.com/drive/folders/i&quot;d\">R&amp;D &lt;old&gt;</a>"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_format_listing_empty() {
        let i18n = I18n::builtin("en").unwrap();
        assert_eq!(format_listing(&[], &i18n), "No folders found.");
    }

    #[test]
    fn test_format_listing_with_header() {
        let i18n = I18n::builtin("en").unwrap();
        let text = format_listing(&["📁 A".to_string(), "    📁 B".to_string()], &i18n);
        assert_eq!(text, "📁 Drive folders:\n📁 A\n    📁 B");
    }
}
