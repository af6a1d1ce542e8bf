use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::TopicId;

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// One subdivision of an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Listening,
    Reading,
    Writing,
    Structure,
}

impl Section {
    /// Stable slug used in storage keys and remote payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Listening => "listening",
            Section::Reading => "reading",
            Section::Writing => "writing",
            Section::Structure => "structure",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "listening" => Some(Self::Listening),
            "reading" => Some(Self::Reading),
            "writing" => Some(Self::Writing),
            "structure" => Some(Self::Structure),
            _ => None,
        }
    }

    /// Free-text sections are scored on completion, not correctness.
    #[must_use]
    pub fn is_free_text(self) -> bool {
        matches!(self, Section::Writing)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EXAM KIND ─────────────────────────────────────────────────────────────────
//

/// Supported exam families.
///
/// - `Ielts`: band-scored (1–9, half points), sections listening/reading/writing.
/// - `ToeflItp`: scaled-integer scored (31–68 per section), sections
///   listening/structure/reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamKind {
    Ielts,
    ToeflItp,
}

const IELTS_SECTIONS: [Section; 3] = [Section::Listening, Section::Reading, Section::Writing];
const TOEFL_SECTIONS: [Section; 3] = [Section::Listening, Section::Structure, Section::Reading];

impl ExamKind {
    pub const ALL: [ExamKind; 2] = [ExamKind::Ielts, ExamKind::ToeflItp];

    /// Sections in exam order.
    #[must_use]
    pub fn sections(self) -> &'static [Section] {
        match self {
            ExamKind::Ielts => &IELTS_SECTIONS,
            ExamKind::ToeflItp => &TOEFL_SECTIONS,
        }
    }

    #[must_use]
    pub fn has_section(self, section: Section) -> bool {
        self.sections().contains(&section)
    }

    /// Storage slug, also used as the remote `examType`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamKind::Ielts => "ielts",
            ExamKind::ToeflItp => "toefl",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "ielts" => Some(Self::Ielts),
            "toefl" | "toefl_itp" => Some(Self::ToeflItp),
            _ => None,
        }
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EXAM MODE ─────────────────────────────────────────────────────────────────
//

/// How a session is run.
///
/// Practice sessions cover a single section of one topic and are recorded in
/// local history. Mock sessions cover every section of the exam and are sent
/// to the remote result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamMode {
    Practice { topic_id: TopicId, section: Section },
    Mock,
}

impl ExamMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamMode::Practice { .. } => "practice",
            ExamMode::Mock => "mock",
        }
    }

    #[must_use]
    pub fn is_practice(&self) -> bool {
        matches!(self, ExamMode::Practice { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_sets_follow_exam_kind() {
        assert_eq!(
            ExamKind::Ielts.sections(),
            &[Section::Listening, Section::Reading, Section::Writing]
        );
        assert!(ExamKind::ToeflItp.has_section(Section::Structure));
        assert!(!ExamKind::ToeflItp.has_section(Section::Writing));
    }

    #[test]
    fn slugs_round_trip() {
        for kind in ExamKind::ALL {
            assert_eq!(ExamKind::from_slug(kind.as_str()), Some(kind));
            for section in kind.sections() {
                assert_eq!(Section::from_slug(section.as_str()), Some(*section));
            }
        }
        assert_eq!(ExamKind::from_slug("gre"), None);
    }
}
