//! Score calculation.
//!
//! Two policies exist, selected by exam kind:
//!
//! - **Band** (IELTS): choice sections map `correct / total` to
//!   `clamp(round(fraction * 9), 1, 9)`; writing is assessed on word-count
//!   completion; the overall band is the section mean rounded to 0.5.
//! - **Scaled** (TOEFL ITP): each section maps to `round(31 + fraction * 37)`
//!   and the overall score is `round(mean(sections) * 10)`, which for the
//!   three-section exam equals `round(sum * 10 / 3)`.
//!
//! A section with no questions has a fraction of 0. All ties round half up.

mod band;
mod report;
pub mod rounding;
pub mod writing;

pub use band::Band;
pub use report::{ScoreReport, ScoreValue, SectionScore};
pub use rounding::{percentage, round_half_up, round_ratio_half_up, round_to_half};
pub use writing::{TaskFeedback, WritingCriterion, WritingFeedback};

use crate::model::{AnswerMap, ExamAnswers, ExamKind, QuestionBank, Section, SectionContent};

/// Lowest TOEFL ITP section score.
pub const SCALED_SECTION_FLOOR: u16 = 31;
/// Width of the TOEFL ITP section scale (31..=68).
pub const SCALED_SECTION_SPAN: u16 = 37;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    BandScore,
    ScaledScore,
}

impl ScoringPolicy {
    #[must_use]
    pub fn for_exam(exam: ExamKind) -> Self {
        match exam {
            ExamKind::Ielts => ScoringPolicy::BandScore,
            ExamKind::ToeflItp => ScoringPolicy::ScaledScore,
        }
    }
}

/// `clamp(round(correct / total * 9), 1, 9)`.
#[must_use]
pub fn band_for_fraction(correct: u32, total: u32) -> Band {
    let whole = round_ratio_half_up(9 * u64::from(correct.min(total)), u64::from(total));
    Band::from_whole(whole)
}

/// `round(31 + correct / total * 37)`.
#[must_use]
pub fn scaled_for_fraction(correct: u32, total: u32) -> u16 {
    let step = round_ratio_half_up(
        u64::from(SCALED_SECTION_SPAN) * u64::from(correct.min(total)),
        u64::from(total),
    );
    SCALED_SECTION_FLOOR + u16::try_from(step).unwrap_or(SCALED_SECTION_SPAN)
}

/// Mean of section bands rounded to the nearest half point.
#[must_use]
pub fn overall_band(bands: &[Band]) -> Band {
    let sum: u64 = bands.iter().map(|b| u64::from(b.half_steps())).sum();
    Band::from_half_steps(round_ratio_half_up(sum, bands.len() as u64))
}

/// `round(mean(section scores) * 10)`; 0 when there are no sections.
#[must_use]
pub fn overall_scaled(scores: &[u16]) -> u16 {
    let sum: u64 = scores.iter().copied().map(u64::from).sum();
    let total = round_ratio_half_up(sum * 10, scores.len() as u64);
    u16::try_from(total).unwrap_or(u16::MAX)
}

/// Score the given sections of a session.
///
/// Only `sections` are scored; a practice session passes just its own section.
#[must_use]
pub fn score(bank: &QuestionBank, answers: &ExamAnswers, sections: &[Section]) -> ScoreReport {
    match answers {
        ExamAnswers::Ielts {
            listening,
            reading,
            writing,
        } => {
            let mut scores = Vec::with_capacity(sections.len());
            let mut feedback = None;
            for &section in sections {
                let content = bank.content(section);
                let score = match section {
                    Section::Listening => choice_band(section, listening, content),
                    Section::Reading => choice_band(section, reading, content),
                    Section::Writing => {
                        let tasks = content.map_or(&[][..], SectionContent::tasks);
                        let assessed = writing::assess(tasks, writing);
                        let score = SectionScore {
                            section,
                            correct: assessed.tasks.iter().map(TaskFeedback::credited_words).sum(),
                            total: assessed.tasks.iter().map(|t| t.min_words).sum(),
                            scaled: ScoreValue::Band(assessed.band),
                        };
                        feedback = Some(assessed);
                        score
                    }
                    Section::Structure => continue,
                };
                scores.push(score);
            }
            let bands: Vec<Band> = scores.iter().filter_map(|s| s.scaled.band()).collect();
            let overall = ScoreValue::Band(overall_band(&bands));
            ScoreReport::new(ScoringPolicy::BandScore, scores, overall, feedback)
        }
        ExamAnswers::ToeflItp {
            listening,
            structure,
            reading,
        } => {
            let scores: Vec<SectionScore> = sections
                .iter()
                .filter_map(|&section| {
                    let map = match section {
                        Section::Listening => listening,
                        Section::Structure => structure,
                        Section::Reading => reading,
                        Section::Writing => return None,
                    };
                    Some(choice_scaled(section, map, bank.content(section)))
                })
                .collect();
            let subs: Vec<u16> = scores.iter().filter_map(|s| s.scaled.scaled()).collect();
            let overall = ScoreValue::Scaled(overall_scaled(&subs));
            ScoreReport::new(ScoringPolicy::ScaledScore, scores, overall, None)
        }
    }
}

fn raw_counts(answers: &AnswerMap, content: Option<&SectionContent>) -> (u32, u32) {
    let questions = content.map_or(&[][..], SectionContent::questions);
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    (answers.correct_count(questions), total)
}

fn choice_band(section: Section, answers: &AnswerMap, content: Option<&SectionContent>) -> SectionScore {
    let (correct, total) = raw_counts(answers, content);
    SectionScore {
        section,
        correct,
        total,
        scaled: ScoreValue::Band(band_for_fraction(correct, total)),
    }
}

fn choice_scaled(section: Section, answers: &AnswerMap, content: Option<&SectionContent>) -> SectionScore {
    let (correct, total) = raw_counts(answers, content);
    SectionScore {
        section,
        correct,
        total,
        scaled: ScoreValue::Scaled(scaled_for_fraction(correct, total)),
    }
}
