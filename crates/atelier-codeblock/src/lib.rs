//! Fenced-code-block extraction for partially received model output.
//!
//! Model answers arrive token by token, so at any instant the text may hold
//! a complete triple-backtick block, a block whose closing fence has not
//! streamed in yet, or no block at all. Both entry points re-derive their
//! result from the full text on every call; the set of complete lines can
//! change retroactively as more characters of the same line arrive, so
//! nothing here is maintained incrementally.
//!
//! Extraction (for the preview pane) and segmentation (for chat rendering)
//! share one fence scanner, so both agree on what counts as a fence: an
//! opening fence is ``` followed by an optional word-character language tag
//! that ends at a newline on the same line. A missing tag defaults to
//! [`DEFAULT_LANGUAGE`] on both paths.

use serde::{Deserialize, Serialize};

/// Language label assumed when the opening fence carries no tag.
pub const DEFAULT_LANGUAGE: &str = "html";

const FENCE: &str = "```";

/// The current best-effort code block of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCode {
    pub language: String,
    pub code: String,
    /// `false` while the closing fence has not arrived yet.
    pub is_complete: bool,
}

/// One renderable unit of a message: plain prose or a fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Text { text: String },
    Code(ExtractedCode),
}

/// A fence match inside the source text, with byte offsets for splitting.
struct RawBlock<'a> {
    start: usize,
    end: usize,
    language: Option<&'a str>,
    body: &'a str,
    is_complete: bool,
}

impl From<RawBlock<'_>> for ExtractedCode {
    fn from(block: RawBlock<'_>) -> Self {
        ExtractedCode {
            language: block.language.unwrap_or(DEFAULT_LANGUAGE).to_string(),
            code: block.body.to_string(),
            is_complete: block.is_complete,
        }
    }
}

/// Locate the next opening fence at or after `from`.
///
/// Returns the fence offset, the body offset (just past the tag line's
/// newline) and the tag. A ``` whose tag line is invalid or still missing
/// its newline does not open a block; the scan continues past it.
fn find_opening_fence(text: &str, from: usize) -> Option<(usize, usize, Option<&str>)> {
    let mut search = from;
    loop {
        let start = search + text[search..].find(FENCE)?;
        let tag_start = start + FENCE.len();
        let rest = &text[tag_start..];

        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());

        if rest[tag_len..].starts_with('\n') {
            let language = (tag_len > 0).then(|| &rest[..tag_len]);
            return Some((start, tag_start + tag_len + 1, language));
        }

        search = start + 1;
    }
}

/// Find the first fenced block at or after `from`. The block is complete
/// when a closing ``` follows the body; otherwise it runs to end of text.
fn next_block(text: &str, from: usize) -> Option<RawBlock<'_>> {
    let (start, body_start, language) = find_opening_fence(text, from)?;

    match text[body_start..].find(FENCE) {
        Some(rel) => {
            let body_end = body_start + rel;
            Some(RawBlock {
                start,
                end: body_end + FENCE.len(),
                language,
                body: &text[body_start..body_end],
                is_complete: true,
            })
        }
        None => Some(RawBlock {
            start,
            end: text.len(),
            language,
            body: &text[body_start..],
            is_complete: false,
        }),
    }
}

/// Extract the first fenced block, complete or still open.
///
/// `None` means the text holds no block (yet): absence, not an error.
pub fn extract(text: &str) -> Option<ExtractedCode> {
    next_block(text, 0).map(ExtractedCode::from)
}

/// Split the whole text into alternating prose and fenced-block segments.
///
/// Every fenced span becomes its own `Code` segment; everything outside is
/// `Text`. An unterminated block swallows the rest of the text, matching
/// [`extract`].
pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(block) = next_block(text, pos) {
        if block.start > pos {
            out.push(Segment::Text {
                text: text[pos..block.start].to_string(),
            });
        }
        pos = block.end;
        out.push(Segment::Code(block.into()));
    }

    if pos < text.len() {
        out.push(Segment::Text {
            text: text[pos..].to_string(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_without_newline_is_not_a_block_yet() {
        assert_eq!(extract("```"), None);
        assert_eq!(extract("```ht"), None);
        assert_eq!(extract("before ```html"), None);
    }

    #[test]
    fn tag_followed_by_non_newline_is_skipped() {
        // no tag line ends in a newline, so the fence is inert
        assert_eq!(extract("``` not a fence"), None);
    }

    #[test]
    fn empty_open_block() {
        let block = extract("```html\n").unwrap();
        assert_eq!(block.language, "html");
        assert_eq!(block.code, "");
        assert!(!block.is_complete);
    }

    #[test]
    fn segments_of_plain_text() {
        assert_eq!(
            segments("no code here"),
            vec![Segment::Text {
                text: "no code here".to_string()
            }]
        );
        assert_eq!(segments(""), Vec::new());
    }
}
