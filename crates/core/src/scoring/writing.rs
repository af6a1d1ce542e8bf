use crate::model::{WritingResponses, WritingTask};
use crate::scoring::Band;
use crate::scoring::rounding::round_ratio_half_up;

/// Assessment criteria reported for each writing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritingCriterion {
    TaskAchievement,
    CoherenceCohesion,
    LexicalResource,
    GrammaticalRange,
}

impl WritingCriterion {
    pub const ALL: [WritingCriterion; 4] = [
        WritingCriterion::TaskAchievement,
        WritingCriterion::CoherenceCohesion,
        WritingCriterion::LexicalResource,
        WritingCriterion::GrammaticalRange,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WritingCriterion::TaskAchievement => "task_achievement",
            WritingCriterion::CoherenceCohesion => "coherence_cohesion",
            WritingCriterion::LexicalResource => "lexical_resource",
            WritingCriterion::GrammaticalRange => "grammatical_range",
        }
    }
}

/// Estimated bands for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFeedback {
    pub task_index: usize,
    pub words: u32,
    pub min_words: u32,
    pub criteria: [(WritingCriterion, Band); 4],
    pub band: Band,
}

impl TaskFeedback {
    /// Words counted towards the minimum (never above it).
    #[must_use]
    pub fn credited_words(&self) -> u32 {
        self.words.min(self.min_words)
    }
}

/// Writing section assessment: per-task feedback plus the weighted section band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingFeedback {
    pub tasks: Vec<TaskFeedback>,
    pub band: Band,
}

/// Counts whitespace-separated tokens that contain at least one alphanumeric character.
#[must_use]
pub fn word_count(text: &str) -> u32 {
    let words = text
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count();
    u32::try_from(words).unwrap_or(u32::MAX)
}

/// Band from the completion ratio `min(words / min_words, 1)`, rounded to 0.5.
///
/// No words or no threshold gives a ratio of 0, which clamps to the band floor.
#[must_use]
pub fn completion_band(words: u32, min_words: u32) -> Band {
    if words == 0 || min_words == 0 {
        return Band::MIN;
    }
    let credited = u64::from(words.min(min_words));
    // ratio * 9 in half steps
    Band::from_half_steps(round_ratio_half_up(18 * credited, u64::from(min_words)))
}

fn assess_task(task_index: usize, task: &WritingTask, text: Option<&str>) -> TaskFeedback {
    let words = text.map_or(0, word_count);
    let signal = completion_band(words, task.min_words());
    let criteria = WritingCriterion::ALL.map(|criterion| (criterion, signal));
    let sum: u64 = criteria.iter().map(|(_, b)| u64::from(b.half_steps())).sum();
    let band = Band::from_half_steps(round_ratio_half_up(sum, criteria.len() as u64));

    TaskFeedback {
        task_index,
        words,
        min_words: task.min_words(),
        criteria,
        band,
    }
}

/// Assess every task of a writing section.
///
/// The section band is the weight-averaged task band rounded to the nearest
/// half point; a section without tasks scores the floor.
#[must_use]
pub fn assess(tasks: &[WritingTask], responses: &WritingResponses) -> WritingFeedback {
    let feedback: Vec<TaskFeedback> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| assess_task(i, task, responses.get(i)))
        .collect();

    let (weighted, weights) = feedback.iter().zip(tasks).fold(
        (0_u64, 0_u64),
        |(sum, weights), (fb, task)| {
            let w = u64::from(task.weight());
            (sum + w * u64::from(fb.band.half_steps()), weights + w)
        },
    );

    WritingFeedback {
        tasks: feedback,
        band: Band::from_half_steps(round_ratio_half_up(weighted, weights)),
    }
}
