//! Context for priority rule evaluation.

use crate::memory::MemoryModel;

/// Runtime state passed to priority rules.
#[derive(Debug, Clone, Default)]
pub struct PriorityContext {
    /// Today's day number.
    pub today: i64,
    /// Forgetting curve for retrievability-based rules.
    pub memory_model: MemoryModel,
}

impl PriorityContext {
    /// Creates a context for the given day.
    pub fn at_day(today: i64) -> Self {
        Self {
            today,
            ..Default::default()
        }
    }

    /// Sets the forgetting curve.
    pub fn with_memory_model(mut self, model: MemoryModel) -> Self {
        self.memory_model = model;
        self
    }
}
