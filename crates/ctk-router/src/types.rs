use ctk_core::CommandCategory;
use std::ops::Range;
use thiserror::Error;

/// Shell operator that ends one segment and starts the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// `|` or `|&`
    Pipe,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `;`
    Semi,
    /// `&`
    Background,
    Newline,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "|",
            Self::Or => "||",
            Self::And => "&&",
            Self::Semi => ";",
            Self::Background => "&",
            Self::Newline => "\\n",
        }
    }

    /// True when the next segment runs as its own command rather than
    /// reading this one's output.
    pub fn starts_command(&self) -> bool {
        !matches!(self, Self::Pipe)
    }
}

/// One simple command of a command line, as byte ranges into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub range: Range<usize>,
    /// Raw (still quoted) words.
    pub words: Vec<Range<usize>>,
    pub preceded_by: Option<Separator>,
}

impl Segment {
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.range.clone()]
    }

    pub fn raw_words<'a>(&self, line: &'a str) -> Vec<&'a str> {
        self.words.iter().map(|r| &line[r.clone()]).collect()
    }
}

/// Shell syntax the segmenter refuses to guess about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("unterminated {quote} quote starting at byte {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("unterminated command substitution starting at byte {offset}")]
    UnterminatedSubstitution { offset: usize },
}

/// Outcome of a subcommand extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The category has no extractor.
    NotApplicable,
    /// Words of the nested command.
    Inner(Vec<String>),
    /// The invocation did not have the expected shape.
    Malformed(&'static str),
}

/// Output of the classifier.
#[derive(Debug, Clone)]
pub struct ClassificationResult<'r> {
    pub matched_category: Option<&'r CommandCategory>,
    /// The command to execute; equal to the input when nothing was rewritten.
    pub rewritten_command: String,
    /// Nested command of a compound invocation.
    pub inner_command: Option<String>,
    /// Index of the segment that matched.
    pub segment_index: Option<usize>,
    /// Normalized text the category matched against.
    pub normalized: Option<String>,
}

impl<'r> ClassificationResult<'r> {
    pub fn passthrough(line: &str) -> Self {
        Self {
            matched_category: None,
            rewritten_command: line.to_string(),
            inner_command: None,
            segment_index: None,
            normalized: None,
        }
    }

    pub fn category_name(&self) -> Option<&'r str> {
        self.matched_category.map(|c| c.name())
    }

    pub fn is_match(&self) -> bool {
        self.matched_category.is_some()
    }
}
