//! HTML to plain text reduction for rich-text attributes
//!
//! Task descriptions and comment bodies arrive as HTML fragments. The
//! reducer is total: malformed markup degrades to a best-effort string and
//! never produces an error.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").unwrap()
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").unwrap());

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|li|ul|ol|h[1-6]|tr|table|thead|tbody|blockquote|pre|section|article|header|footer|hr)\b[^>]*>",
    )
    .unwrap()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z!][^>]*>").unwrap());

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f\v]+").unwrap());

/// Strip markup from `html`, keeping block structure as newlines.
///
/// Lines are whitespace-collapsed and trimmed, blank lines are dropped and
/// the result is trimmed. Plain text without markup passes through with
/// only whitespace normalization applied.
///
/// Decoding entities can expose new markup (`&lt;div&gt;` becomes `<div>`),
/// so the reduction is repeated until the text stops changing. The result is
/// a fixed point: reducing it again returns it unchanged.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return normalize_lines(html);
    }

    // A changing pass either shortens the text or only rewrites whitespace;
    // the bound is a backstop.
    let mut text = reduce(html);
    for _ in 0..html.len() {
        let next = reduce(&text);
        if next == text {
            break;
        }
        text = next;
    }
    text
}

fn reduce(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return normalize_lines(html);
    }

    let text = COMMENT.replace_all(html, "");
    let text = SCRIPT_OR_STYLE.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "\n- ");
    let text = BLOCK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = ENTITY.replace_all(&text, |caps: &Captures| decode_entity(&caps[1], &caps[0]));

    normalize_lines(&text)
}

fn decode_entity(name: &str, original: &str) -> String {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => numeric.parse::<u32>().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(|c| if c == '\u{a0}' { ' ' } else { c })
            .map(String::from)
            .unwrap_or_else(|| original.to_string());
    }

    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "euro" => "\u{20ac}",
        _ => return original.to_string(),
    };
    decoded.to_string()
}

fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_paragraph() {
        assert_eq!(html_to_text("<p>Broken</p>"), "Broken");
    }

    #[test]
    fn test_blocks_become_lines() {
        let html = "<h2>Steps</h2><p>Open the <b>app</b></p><div>Click&nbsp;save</div>";
        assert_eq!(html_to_text(html), "Steps\nOpen the app\nClick save");
    }

    #[test]
    fn test_lists_and_breaks() {
        let html = "<ul><li>one</li><li>two</li></ul>first<br>second<br/>third";
        assert_eq!(html_to_text(html), "- one\n- two\nfirst\nsecond\nthird");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            html_to_text("Tom &amp; Jerry &quot;quoted&quot; &#8364;5 &#x41;"),
            "Tom & Jerry \"quoted\" \u{20ac}5 A"
        );
        assert_eq!(html_to_text("&unknown; stays"), "&unknown; stays");
    }

    #[test]
    fn test_script_and_comments_removed() {
        let html = "<p>keep</p><script>alert('x')</script><!-- hidden --><style>p{}</style>";
        assert_eq!(html_to_text(html), "keep");
    }

    #[test]
    fn test_malformed_markup_is_best_effort() {
        assert_eq!(html_to_text("<p>unclosed <b>bold"), "unclosed bold");
        assert_eq!(html_to_text("a < b and c > d"), "a < b and c > d");
        assert_eq!(html_to_text("<p>dangling <a href=\"x\""), "dangling <a href=\"x\"");
    }

    #[test]
    fn test_empty_markup_yields_empty() {
        assert_eq!(html_to_text("<p></p><br>"), "");
        assert_eq!(html_to_text("   "), "");
    }

    #[test]
    fn test_escaped_markup_reaches_fixed_point() {
        let once = html_to_text("<p>Wrap it in &lt;div&gt; tags</p>");
        assert_eq!(once, "Wrap it in\ntags");
        assert_eq!(html_to_text(&once), once);

        let once = html_to_text("Use &amp;lt;b&amp;gt; for bold");
        assert_eq!(once, "Use for bold");
        assert_eq!(html_to_text(&once), once);

        let once = html_to_text("&amp;amp;amp;amp;");
        assert_eq!(once, "&");
        assert_eq!(html_to_text(&once), once);
    }

    #[test]
    fn test_reduction_is_stable() {
        let html = "<p>Line  one</p>\n\n<p>Line two</p>";
        let once = html_to_text(html);
        assert_eq!(once, "Line one\nLine two");
        assert_eq!(html_to_text(&once), once);
    }
}
