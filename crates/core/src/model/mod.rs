mod answers;
mod exam;
mod history;
mod question;
mod settings;

pub use answers::{AnswerMap, ExamAnswers, WritingResponses};
pub use exam::{ExamKind, ExamMode, Section};
pub use history::{HistoryEntry, TopicId, WritingSnapshot};
pub use question::{Choice, Question, QuestionBank, SectionContent, WritingTask};
pub use settings::{
    ExamSettings, HISTORY_CAP, ResultStoreSettings, ResultStoreSettingsDraft, SettingsError,
};
