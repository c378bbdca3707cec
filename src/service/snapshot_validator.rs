//! Completeness rules for condition snapshots.

use std::fmt;

use serde::Serialize;

use crate::domain::{ConditionSnapshot, PhotoCategory};
use crate::error::RentalError;

/// A single failed completeness rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "category", rename_all = "snake_case")]
pub enum SnapshotIssue {
    /// No odometer reading.
    MissingOdometer,
    /// Odometer reading below zero.
    NegativeOdometer,
    /// No fuel level.
    MissingFuelLevel,
    /// Fuel fraction outside `[0, 1]`.
    FuelLevelOutOfRange,
    /// A photo category has no entries.
    MissingPhotos(PhotoCategory),
    /// A photo reference in the category is blank.
    BlankPhotoReference(PhotoCategory),
    /// Agreement reference is blank.
    MissingAgreementReference,
}

impl fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOdometer => f.write_str("odometer reading is required"),
            Self::NegativeOdometer => f.write_str("odometer reading must not be negative"),
            Self::MissingFuelLevel => f.write_str("fuel level is required"),
            Self::FuelLevelOutOfRange => f.write_str("fuel level must be between 0 and 1"),
            Self::MissingPhotos(category) => write!(f, "at least one {category} photo is required"),
            Self::BlankPhotoReference(category) => {
                write!(f, "{category} photo references must not be blank")
            }
            Self::MissingAgreementReference => f.write_str("agreement reference is required"),
        }
    }
}

/// Checks captured evidence before a transition may commit.
///
/// Rules run in a fixed order: odometer, fuel level, photo categories
/// (agreement, identity document, exterior panels), agreement reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionSnapshotValidator;

impl ConditionSnapshotValidator {
    /// Creates a validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Fail-fast validation returning the first broken rule.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::IncompleteSnapshot`] with the first issue.
    pub fn validate(&self, snapshot: &ConditionSnapshot) -> Result<(), RentalError> {
        match self.validate_all(snapshot).first() {
            Some(issue) => Err(RentalError::IncompleteSnapshot(*issue)),
            None => Ok(()),
        }
    }

    /// Returns every broken rule in rule order; empty when valid.
    #[must_use]
    pub fn validate_all(&self, snapshot: &ConditionSnapshot) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();

        match snapshot.odometer {
            None => issues.push(SnapshotIssue::MissingOdometer),
            Some(reading) if reading < 0 => issues.push(SnapshotIssue::NegativeOdometer),
            Some(_) => {}
        }

        match snapshot.fuel_level {
            None => issues.push(SnapshotIssue::MissingFuelLevel),
            Some(level) if !level.is_in_range() => issues.push(SnapshotIssue::FuelLevelOutOfRange),
            Some(_) => {}
        }

        for category in PhotoCategory::ALL {
            let references = snapshot.photos.category(category);
            if references.is_empty() {
                issues.push(SnapshotIssue::MissingPhotos(category));
            } else if references.iter().any(|r| r.trim().is_empty()) {
                issues.push(SnapshotIssue::BlankPhotoReference(category));
            }
        }

        if snapshot.agreement_reference.trim().is_empty() {
            issues.push(SnapshotIssue::MissingAgreementReference);
        }

        issues
    }
}
