//! Plain / highlighted segment splitting
//!
//! Both highlight strategies cut a run's text into an ordered sequence of
//! segments. Concatenating the segments always yields the original text:
//! spans that are out of bounds, not on a char boundary or overlapping an
//! earlier span are left as plain text instead of being drawn.

use std::ops::Range;

use serde::Serialize;

/// A span of a run's text to highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    /// Byte range in the run text
    pub range: Range<usize>,
    /// Id of the match this span draws
    pub match_id: usize,
    /// Whether this is the current match
    pub current: bool,
}

/// Kind of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SegmentKind {
    Plain,
    #[serde(rename_all = "camelCase")]
    Highlight { match_id: usize, current: bool },
}

/// One piece of a run's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    #[serde(flatten)]
    pub kind: SegmentKind,
}

impl Segment {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: SegmentKind::Plain,
        }
    }

    pub fn is_highlight(&self) -> bool {
        matches!(self.kind, SegmentKind::Highlight { .. })
    }

    pub fn is_current(&self) -> bool {
        matches!(self.kind, SegmentKind::Highlight { current: true, .. })
    }
}

/// Split `text` around `spans` (sorted by start)
pub fn split(text: &str, spans: &[HighlightSpan]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;

    for span in spans {
        let Range { start, end } = span.range;
        let valid = start >= cursor
            && start < end
            && end <= text.len()
            && text.is_char_boundary(start)
            && text.is_char_boundary(end);
        if !valid {
            tracing::trace!(start, end, "Skipping unusable highlight span");
            continue;
        }

        if start > cursor {
            segments.push(Segment::plain(&text[cursor..start]));
        }
        segments.push(Segment {
            text: text[start..end].to_string(),
            kind: SegmentKind::Highlight {
                match_id: span.match_id,
                current: span.current,
            },
        });
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }
    segments
}

/// Reassemble the text of a segment sequence
pub fn concat(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(range: Range<usize>, match_id: usize, current: bool) -> HighlightSpan {
        HighlightSpan {
            range,
            match_id,
            current,
        }
    }

    #[test]
    fn test_split_cat_sat_mat() {
        let text = "The cat sat on the mat";
        let spans = [span(5..7, 0, false), span(9..11, 1, true), span(20..22, 2, false)];
        let segments = split(text, &spans);

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["The c", "at", " s", "at", " on the m", "at"]);
        assert_eq!(segments.iter().filter(|s| s.is_highlight()).count(), 3);
        assert_eq!(segments.iter().filter(|s| s.is_current()).count(), 1);
        assert_eq!(concat(&segments), text);
    }

    #[test]
    fn test_split_without_spans_is_single_plain_segment() {
        let segments = split("plain", &[]);
        assert_eq!(segments, vec![Segment::plain("plain")]);
        assert!(split("", &[]).is_empty());
    }

    #[test]
    fn test_split_whole_text() {
        let segments = split("word", &[span(0..4, 0, false)]);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_highlight());
    }

    #[test]
    fn test_invalid_spans_never_lose_text() {
        let text = "héllo world";
        let spans = [
            span(2..3, 0, false),  // inside a multi-byte char
            span(7..12, 1, false), // overlaps the next one
            span(8..10, 2, false),
            span(40..50, 3, false), // out of bounds
            span(4..4, 4, false),   // empty
        ];
        let segments = split(text, &spans);
        assert_eq!(concat(&segments), text);
        assert_eq!(segments.iter().filter(|s| s.is_highlight()).count(), 1);
    }

    #[test]
    fn test_segment_serialization() {
        let json = serde_json::to_string(&split("ab", &[span(1..2, 7, true)])).unwrap();
        assert_eq!(
            json,
            r#"[{"text":"a","kind":"plain"},{"text":"b","kind":"highlight","matchId":7,"current":true}]"#
        );
    }
}
