//! Input validation for allocation calls.
//!
//! Checks structural integrity of items and sibling groups before
//! allocation. Detects:
//! - Duplicate card IDs
//! - Windows that contain no candidate day
//! - Sibling groups mixing notes
//! - Non-finite or negative stability

use crate::models::{GroupMember, Item, NoteId};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two items share the same card ID.
    DuplicateId,
    /// No candidate day lies inside the item's window.
    RangeOutsideCandidates,
    /// Members of one sibling group belong to different notes.
    MixedGroup,
    /// Stability is NaN, infinite or negative.
    InvalidStability,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates items for a bulk allocation.
///
/// `candidate_days` must be ascending; an empty slice skips the window
/// check.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_items(items: &[Item], candidate_days: &[i64]) -> ValidationResult {
    let mut errors = Vec::new();
    check_items(items.iter(), &mut errors);

    if !candidate_days.is_empty() {
        for item in items {
            let range = item.feasible_range;
            let first = candidate_days.partition_point(|&d| d < range.low());
            if candidate_days.get(first).map_or(true, |&d| d > range.high()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RangeOutsideCandidates,
                    format!(
                        "Item {} window [{}, {}] contains no candidate day",
                        item.id,
                        range.low(),
                        range.high()
                    ),
                ));
            }
        }
    }

    finish(errors)
}

/// Validates the members of one sibling group.
///
/// Anchors are not checked; card members must share one group key (or all
/// have none).
pub fn validate_group(members: &[GroupMember]) -> ValidationResult {
    let mut errors = Vec::new();
    check_items(members.iter().filter_map(GroupMember::item), &mut errors);

    let keys: HashSet<Option<NoteId>> = members
        .iter()
        .filter_map(GroupMember::item)
        .map(|item| item.group_key)
        .collect();
    if keys.len() > 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::MixedGroup,
            format!("Sibling group spans {} different notes", keys.len()),
        ));
    }

    finish(errors)
}

fn check_items<'a>(items: impl Iterator<Item = &'a Item>, errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for item in items {
        if !ids.insert(item.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate card ID: {}", item.id),
            ));
        }
        if !item.stability.is_finite() || item.stability < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStability,
                format!("Item {} has stability {}", item.id, item.stability),
            ));
        }
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
