//! Runtime options

/// What to do when a class or generic name is defined again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedefinitionPolicy {
    /// Replace silently
    #[default]
    Replace,
    /// Replace and emit a warning
    Warn,
}

/// Options for a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Maximum number of inheritance steps from a class to the root (None = unlimited)
    pub max_inheritance_depth: Option<usize>,

    /// Behavior on redefinition of a registered name
    pub redefinition: RedefinitionPolicy,
}

impl RuntimeOptions {
    /// Options with no limits and silent redefinition
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limit inheritance depth
    pub fn with_max_inheritance_depth(mut self, depth: usize) -> Self {
        self.max_inheritance_depth = Some(depth);
        self
    }

    /// Set the redefinition policy
    pub fn with_redefinition(mut self, policy: RedefinitionPolicy) -> Self {
        self.redefinition = policy;
        self
    }
}
