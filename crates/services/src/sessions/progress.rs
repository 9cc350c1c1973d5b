/// Aggregated view of session progress, useful for a host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: u32,
    pub mistakes: u32,
    pub remaining: usize,
    pub is_complete: bool,
}
