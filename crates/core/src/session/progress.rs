use crate::model::Section;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub section: Section,
    pub position: usize,
    pub section_len: usize,
    pub answered: usize,
    pub total: usize,
    pub remaining_secs: Option<u32>,
    pub is_complete: bool,
}
