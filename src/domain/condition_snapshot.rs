//! Condition evidence captured at pickup and return.
//!
//! A [`ConditionSnapshot`] is historical evidence: once stored on a job it
//! is never mutated. Mistakes are fixed by appending a
//! [`SnapshotCorrection`], which leaves the original untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ActorId;

/// Transition at which a snapshot was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    /// Vehicle handed over to the customer.
    Pickup,
    /// Vehicle recovered from the customer.
    Return,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup => f.write_str("pickup"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// Fuel gauge reading, either categorical or an exact fraction of a tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelLevel {
    /// Empty tank.
    Empty,
    /// One quarter.
    Quarter,
    /// One half.
    Half,
    /// Three quarters.
    ThreeQuarters,
    /// Full tank.
    Full,
    /// Exact fraction; valid only within `[0, 1]`.
    Fraction(Decimal),
}

impl FuelLevel {
    /// Returns the reading as a fraction of a full tank.
    #[must_use]
    pub fn as_fraction(&self) -> Decimal {
        match self {
            Self::Empty => Decimal::ZERO,
            Self::Quarter => Decimal::new(25, 2),
            Self::Half => Decimal::new(5, 1),
            Self::ThreeQuarters => Decimal::new(75, 2),
            Self::Full => Decimal::ONE,
            Self::Fraction(value) => *value,
        }
    }

    /// Returns `true` if the reading lies within `[0, 1]`.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        let value = self.as_fraction();
        value >= Decimal::ZERO && value <= Decimal::ONE
    }
}

/// Photo evidence categories required on every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCategory {
    /// Signed rental agreement pages.
    Agreement,
    /// Customer identity document.
    IdentityDocument,
    /// Exterior body panels of the vehicle.
    ExteriorPanels,
}

impl PhotoCategory {
    /// All categories in validation order.
    pub const ALL: [Self; 3] = [Self::Agreement, Self::IdentityDocument, Self::ExteriorPanels];
}

impl fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agreement => f.write_str("agreement"),
            Self::IdentityDocument => f.write_str("identity document"),
            Self::ExteriorPanels => f.write_str("exterior panels"),
        }
    }
}

/// Ordered image references grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEvidence {
    /// Agreement photos.
    pub agreement: Vec<String>,
    /// Identity-document photos.
    pub identity_document: Vec<String>,
    /// Exterior-panel photos.
    pub exterior_panels: Vec<String>,
}

impl PhotoEvidence {
    /// Returns the references stored for a category.
    #[must_use]
    pub fn category(&self, category: PhotoCategory) -> &[String] {
        match category {
            PhotoCategory::Agreement => &self.agreement,
            PhotoCategory::IdentityDocument => &self.identity_document,
            PhotoCategory::ExteriorPanels => &self.exterior_panels,
        }
    }

    /// Appends an image reference to a category.
    pub fn push(&mut self, category: PhotoCategory, reference: impl Into<String>) {
        let slot = match category {
            PhotoCategory::Agreement => &mut self.agreement,
            PhotoCategory::IdentityDocument => &mut self.identity_document,
            PhotoCategory::ExteriorPanels => &mut self.exterior_panels,
        };
        slot.push(reference.into());
    }
}

/// Evidentiary record captured at a pickup or return.
///
/// Fields that the validator checks for presence are optional here so
/// that a half-filled capture form can be represented and rejected with a
/// precise reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    /// Transition this snapshot belongs to.
    pub kind: CaptureKind,
    /// Odometer reading in kilometres.
    pub odometer: Option<i64>,
    /// Fuel gauge reading.
    pub fuel_level: Option<FuelLevel>,
    /// Photo evidence by category.
    pub photos: PhotoEvidence,
    /// Rental agreement reference number.
    pub agreement_reference: String,
    /// Staff member who performed the capture.
    pub captured_by: ActorId,
    /// Capture timestamp.
    pub captured_at: DateTime<Utc>,
}

impl ConditionSnapshot {
    /// Starts an empty capture for the given transition, stamped now.
    #[must_use]
    pub fn new(kind: CaptureKind, captured_by: ActorId) -> Self {
        Self {
            kind,
            odometer: None,
            fuel_level: None,
            photos: PhotoEvidence::default(),
            agreement_reference: String::new(),
            captured_by,
            captured_at: Utc::now(),
        }
    }

    /// Sets the odometer reading.
    #[must_use]
    pub fn with_odometer(mut self, reading: i64) -> Self {
        self.odometer = Some(reading);
        self
    }

    /// Sets the fuel level.
    #[must_use]
    pub fn with_fuel_level(mut self, level: FuelLevel) -> Self {
        self.fuel_level = Some(level);
        self
    }

    /// Adds one photo reference to a category.
    #[must_use]
    pub fn with_photo(mut self, category: PhotoCategory, reference: impl Into<String>) -> Self {
        self.photos.push(category, reference);
        self
    }

    /// Sets the agreement reference.
    #[must_use]
    pub fn with_agreement_reference(mut self, reference: impl Into<String>) -> Self {
        self.agreement_reference = reference.into();
        self
    }
}

/// Replacement evidence appended after a transition has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCorrection {
    /// Corrected evidence.
    pub snapshot: ConditionSnapshot,
    /// Why the correction was recorded.
    pub reason: String,
    /// Staff member who recorded the correction.
    pub recorded_by: ActorId,
    /// When the correction was recorded.
    pub recorded_at: DateTime<Utc>,
}
