//! What happens to assistant text when the upstream fails mid-stream

/// Decision point for partial assistant output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartialResponsePolicy {
    /// Drop the partial text; only the user turn remains persisted
    #[default]
    Discard,
    /// Store non-empty partial text as an assistant message
    Persist,
}

impl PartialResponsePolicy {
    /// The text to persist for a failed turn, if any
    pub fn retained(self, partial: &str) -> Option<&str> {
        match self {
            PartialResponsePolicy::Discard => None,
            PartialResponsePolicy::Persist => Some(partial).filter(|text| !text.is_empty()),
        }
    }
}
