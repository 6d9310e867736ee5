//! Heuristic line-grouping classifier.
//!
//! The fallback strategy: buckets raw OCR tokens into visual lines by their
//! `top` pixel coordinate, joins each line's text, and assigns a field type
//! via pattern rules. Question lines additionally pair with the following
//! line as their answer. All coordinates stay in pixel space and confidences
//! stay on the engine's 0–100 scale.

use crate::domain::field::{BBox, Field, FieldKind};
use crate::domain::token::RawToken;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns marking a line as a question or form label.
static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Leading interrogative word
        r"(?i)^(what|who|when|where|why|how)",
        // Ends with question mark
        r"\?$",
        // Ends with colon
        r":$",
        // Numbered items
        r"^[0-9]+\.",
        // Common instruction words
        r"(?i)please|specify|describe|explain|list",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("question pattern"))
    .collect()
});

/// Patterns marking a line as a section header.
///
/// The uppercase-run pattern is deliberately case-sensitive: matching it
/// case-insensitively would turn any four lowercase letters into a header.
static HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Section headers
        r"(?i)^section|part \d+",
        // All caps text of 4+ chars
        r"[A-Z\s]{4,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("header pattern"))
    .collect()
});

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Configuration for the heuristic classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicConfig {
    /// Maximum `top` difference in pixels for tokens to share a line.
    ///
    /// The default of 0 groups only tokens whose top edges are
    /// pixel-identical, the literal legacy behavior. Raise it to tolerate
    /// small vertical jitter between words of one visual line.
    pub line_tolerance: u32,
}

/// A visual text line: the bucket key plus its tokens in reading order.
struct LineGroup<'a> {
    top: u32,
    tokens: Vec<&'a RawToken>,
}

impl LineGroup<'_> {
    fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).join(" ")
    }

    fn mean_confidence(&self) -> f32 {
        let sum: f32 = self.tokens.iter().map(|t| t.confidence).sum();
        sum / self.tokens.len() as f32
    }

    /// Aggregated line box: min/max over the line's tokens, so the result is
    /// independent of token order and degenerates to a single token's own
    /// box for one-token lines. Height is the tallest token's height, not
    /// the vertical extent.
    fn bbox(&self) -> BBox {
        let min_left = self.tokens.iter().map(|t| t.left).min().unwrap_or(0);
        let max_right = self.tokens.iter().map(|t| t.right()).max().unwrap_or(0);
        let max_height = self.tokens.iter().map(|t| t.height).max().unwrap_or(0);

        BBox {
            x: min_left as i64,
            y: self.top as i64,
            width: (max_right - min_left) as i64,
            height: max_height as i64,
        }
    }

    fn field(&self, kind: FieldKind) -> Field {
        Field {
            text: self.text(),
            kind,
            confidence: self.mean_confidence(),
            bbox: self.bbox(),
        }
    }
}

/// Groups raw tokens into lines and classifies each line by pattern rules.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    config: HeuristicConfig,
}

impl HeuristicClassifier {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    /// Classifies raw OCR tokens into fields.
    ///
    /// A line matching a question pattern looks ahead to the nearest line
    /// with a strictly greater y; if that line does not itself look like a
    /// question, it is emitted as an `answer` field ahead of the question's
    /// own field, and emitted again when its own iteration comes around
    /// (usually as `other`). That duplication is a known quirk of the legacy
    /// contract; downstream consumers may rely on either occurrence, so it
    /// is preserved rather than deduplicated.
    pub fn classify(&self, tokens: &[RawToken]) -> Vec<Field> {
        let lines = self.group_lines(tokens);
        let mut fields = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let text = line.text();

            let kind = if matches_any(&HEADER_PATTERNS, &text) {
                FieldKind::Header
            } else if matches_any(&QUESTION_PATTERNS, &text) {
                if let Some(next) = lines.get(index + 1) {
                    if !matches_any(&QUESTION_PATTERNS, &next.text()) {
                        fields.push(next.field(FieldKind::Answer));
                    }
                }
                FieldKind::Question
            } else {
                FieldKind::Other
            };

            fields.push(line.field(kind));
        }

        fields
    }

    /// Buckets non-empty tokens into lines, ordered by ascending y.
    ///
    /// Tokens join the current line while their `top` is within
    /// `line_tolerance` of the line's first token; with the default
    /// tolerance of 0 this is exact-pixel grouping.
    fn group_lines<'a>(&self, tokens: &'a [RawToken]) -> Vec<LineGroup<'a>> {
        let mut sorted: Vec<&RawToken> = tokens
            .iter()
            .filter(|t| !t.text.trim().is_empty())
            .collect();
        sorted.sort_by_key(|t| t.top);

        let mut lines: Vec<LineGroup<'a>> = Vec::new();
        for token in sorted {
            match lines.last_mut() {
                Some(line) if token.top - line.top <= self.config.line_tolerance => {
                    line.tokens.push(token);
                }
                _ => lines.push(LineGroup {
                    top: token.top,
                    tokens: vec![token],
                }),
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, left: u32, top: u32, width: u32, height: u32, conf: f32) -> RawToken {
        RawToken::new(text, left, top, width, height, conf)
    }

    /// The legacy regression scenario: a question line, a plain line below
    /// it, and an all-caps header. The middle line must appear twice: once
    /// as the question's paired answer, once as its own `other` line.
    #[test]
    fn question_answer_header_scenario() {
        let tokens = vec![
            token("Question", 10, 10, 60, 12, 95.0),
            token("1:", 75, 10, 15, 12, 93.0),
            token("Answer", 10, 50, 50, 12, 90.0),
            token("here", 65, 50, 30, 12, 88.0),
            token("HEADER", 10, 100, 70, 14, 97.0),
        ];

        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields.len(), 4);

        assert_eq!(fields[0].kind, FieldKind::Answer);
        assert_eq!(fields[0].text, "Answer here");
        assert_eq!(fields[0].bbox.y, 50);

        assert_eq!(fields[1].kind, FieldKind::Question);
        assert_eq!(fields[1].text, "Question 1:");
        assert_eq!(fields[1].bbox.y, 10);

        assert_eq!(fields[2].kind, FieldKind::Other);
        assert_eq!(fields[2].text, "Answer here");

        assert_eq!(fields[3].kind, FieldKind::Header);
        assert_eq!(fields[3].text, "HEADER");
    }

    #[test]
    fn confidence_is_mean_of_line_tokens_on_engine_scale() {
        let tokens = vec![
            token("Name:", 10, 10, 40, 12, 80.0),
            token("Alice", 60, 10, 40, 12, 90.0),
        ];

        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields.len(), 1);
        assert!((fields[0].confidence - 85.0).abs() < f32::EPSILON);
    }

    #[test]
    fn line_bbox_aggregates_min_max_over_tokens() {
        // Same line, tokens deliberately out of reading order.
        let tokens = vec![
            token("world", 100, 20, 50, 15, 90.0),
            token("hello", 10, 20, 40, 12, 90.0),
        ];

        let fields = HeuristicClassifier::default().classify(&tokens);
        let bbox = fields[0].bbox;
        assert_eq!(bbox.x, 10);
        assert_eq!(bbox.width, 140);
        assert_eq!(bbox.height, 15);
        assert!(bbox.width >= 0 && bbox.height >= 0);
    }

    #[test]
    fn single_token_line_degenerates_to_its_own_box() {
        let tokens = vec![token("lonely", 30, 12, 45, 11, 75.0)];
        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(
            fields[0].bbox,
            BBox {
                x: 30,
                y: 12,
                width: 45,
                height: 11
            }
        );
    }

    #[test]
    fn consecutive_questions_do_not_pair_answers() {
        let tokens = vec![
            token("Name:", 10, 10, 40, 12, 90.0),
            token("Address:", 10, 30, 60, 12, 90.0),
        ];

        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.kind == FieldKind::Question));
    }

    #[test]
    fn numbered_items_and_instruction_words_are_questions() {
        let tokens = vec![
            token("1.", 10, 10, 15, 12, 90.0),
            token("Overview", 30, 10, 60, 12, 90.0),
        ];
        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields[0].kind, FieldKind::Question);

        let tokens = vec![
            token("Specify", 10, 10, 50, 12, 90.0),
            token("your", 65, 10, 30, 12, 90.0),
            token("role", 100, 10, 30, 12, 90.0),
        ];
        let fields = HeuristicClassifier::default().classify(&tokens);
        // "Specify your role" has no following line, so only the question
        // itself is emitted.
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, FieldKind::Question);
    }

    #[test]
    fn lowercase_prose_is_not_a_header() {
        let tokens = vec![
            token("plain", 10, 10, 40, 12, 90.0),
            token("prose", 55, 10, 40, 12, 90.0),
        ];
        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields[0].kind, FieldKind::Other);
    }

    #[test]
    fn section_marker_is_a_header_case_insensitively() {
        let tokens = vec![
            token("Section", 10, 10, 50, 12, 90.0),
            token("two", 65, 10, 25, 12, 90.0),
        ];
        let fields = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(fields[0].kind, FieldKind::Header);
    }

    #[test]
    fn tolerance_band_merges_jittered_lines() {
        let tokens = vec![
            token("left", 10, 20, 30, 12, 90.0),
            token("right", 50, 22, 35, 12, 90.0),
        ];

        let exact = HeuristicClassifier::default().classify(&tokens);
        assert_eq!(exact.len(), 2);

        let tolerant = HeuristicClassifier::new(HeuristicConfig { line_tolerance: 3 });
        let merged = tolerant.classify(&tokens);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "left right");
    }

    #[test]
    fn empty_tokens_produce_no_fields() {
        let tokens = vec![token("  ", 10, 10, 5, 5, 90.0)];
        assert!(HeuristicClassifier::default().classify(&tokens).is_empty());
    }
}
