use crate::types::{Line, TextSegment};

/// Merge consecutive spans with the same font and size into segments.
///
/// A span that starts a new source line inside a running segment is joined
/// with `\n`. Whitespace-only spans never break a segment, but they do
/// count as the start of their line.
pub fn group_spans(lines: &[Line]) -> Vec<TextSegment> {
    let mut segments: Vec<TextSegment> = Vec::new();
    let mut current: Option<TextSegment> = None;
    let mut current_line_y: Option<f64> = None;

    for line in lines {
        for span in &line.spans {
            let span_y = span.origin[1];

            if span.text.trim().is_empty() {
                if let Some(segment) = current.as_mut() {
                    segment.text.push_str(&span.text);
                }
                current_line_y = Some(span_y);
                continue;
            }

            match current.as_mut() {
                Some(segment) if segment.font == span.font && segment.font_size == span.size => {
                    if current_line_y != Some(span_y) {
                        segment.text.push('\n');
                    }
                    segment.text.push_str(&span.text);
                }
                _ => {
                    if let Some(done) = current.take() {
                        segments.push(done);
                    }
                    current = Some(TextSegment {
                        text: span.text.clone(),
                        font: span.font.clone(),
                        font_size: span.size,
                    });
                }
            }
            current_line_y = Some(span_y);
        }
    }

    if let Some(done) = current {
        segments.push(done);
    }
    segments
}
