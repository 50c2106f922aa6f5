use serde::{Deserialize, Serialize};

/// A document after the upstream intake pipeline has normalized it.
///
/// `offset_map` maps normalized offsets back to original offsets and is
/// non-decreasing; the core never inspects the original text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedDoc {
    pub doc_id: String,
    pub text: String,
    pub offset_map: Vec<(usize, usize)>,
}

/// One contiguous slice of the normalized document, as produced by the
/// upstream segmenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub id: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub heading: Option<String>,
    pub clause_type: Option<String>,
    pub number: Option<String>,
    pub kind: Option<String>,
}

impl Segment {
    /// Heading and body joined for token scans. The heading often carries the
    /// clause's only occurrence of its legal term of art.
    pub fn combined_text(&self) -> String {
        match &self.heading {
            Some(h) if !h.trim().is_empty() => format!("{}\n{}", h, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Segments in document order: ascending `start`, ties broken by `id`.
///
/// Graph construction uses this so that permuting the input vector cannot
/// change which segment is "first" for anchor selection.
pub fn in_document_order(segments: &[Segment]) -> Vec<&Segment> {
    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    ordered
}
