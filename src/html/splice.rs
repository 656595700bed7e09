//! Span splicing and anchor insertion.
//!
//! All functions take byte spans computed against the same `html` they
//! edit. Spans must not overlap.

use std::ops::Range;

use super::scan::{body_close_start, head_close_start, head_open_end};

/// Replace each span with its replacement, in one pass.
pub fn replace_spans(html: &str, edits: &mut [(Range<usize>, String)]) -> String {
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for (span, replacement) in edits.iter() {
        if span.start < cursor {
            continue;
        }
        out.push_str(&html[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
    }
    out.push_str(&html[cursor..]);
    out
}

/// Remove every span.
pub fn remove_spans(html: &str, spans: impl IntoIterator<Item = Range<usize>>) -> String {
    let mut edits: Vec<_> = spans.into_iter().map(|s| (s, String::new())).collect();
    replace_spans(html, &mut edits)
}

fn insert_at(html: &str, at: usize, fragment: &str) -> String {
    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..at]);
    out.push_str(fragment);
    out.push_str(&html[at..]);
    out
}

/// Insert right before the first `</head>`, `None` without one.
pub fn insert_before_head_end(html: &str, fragment: &str) -> Option<String> {
    head_close_start(html).map(|at| insert_at(html, at, fragment))
}

/// Insert right after the opening `<head>` tag, `None` without one.
pub fn insert_after_head_start(html: &str, fragment: &str) -> Option<String> {
    head_open_end(html).map(|at| insert_at(html, at, fragment))
}

/// Insert right before the last `</body>`, `None` without one.
pub fn insert_before_body_end(html: &str, fragment: &str) -> Option<String> {
    body_close_start(html).map(|at| insert_at(html, at, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_spans_out_of_order() {
        let html = "<a><b><c>";
        let mut edits = vec![(6..9, "C".to_string()), (0..3, "A".to_string())];
        assert_eq!(replace_spans(html, &mut edits), "A<b>C");
    }

    #[test]
    fn test_remove_spans() {
        let html = "x<link a>y<link b>z";
        assert_eq!(remove_spans(html, [1..9, 10..18]), "xyz");
        assert_eq!(remove_spans(html, []), html);
    }

    #[test]
    fn test_anchor_insertion() {
        let html = "<head><title>t</title></HEAD><body><p>1</p></body>";
        assert_eq!(
            insert_before_head_end(html, "<x>").unwrap(),
            "<head><title>t</title><x></HEAD><body><p>1</p></body>"
        );
        assert_eq!(
            insert_after_head_start(html, "<x>").unwrap(),
            "<head><x><title>t</title></HEAD><body><p>1</p></body>"
        );
        assert_eq!(
            insert_before_body_end(html, "<x>").unwrap(),
            "<head><title>t</title></HEAD><body><p>1</p><x></body>"
        );
    }

    #[test]
    fn test_missing_anchor_is_none() {
        assert!(insert_before_head_end("<p>fragment</p>", "<x>").is_none());
        assert!(insert_before_body_end("<p>fragment</p>", "<x>").is_none());
    }

    #[test]
    fn test_body_end_uses_last_occurrence() {
        let html = "<body><script>s='</body>'</script></body>";
        let out = insert_before_body_end(html, "<x>").unwrap();
        assert!(out.ends_with("<x></body>"));
    }
}
