//! Staff role membership seam.
//!
//! Role management lives outside this crate; services only ask whether an
//! actor may perform staff operations.

use std::collections::HashSet;

use crate::domain::ActorId;
use crate::error::RentalError;

/// External predicate answering whether an actor holds a staff role.
pub trait StaffRoleCheck: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `actor` is staff.
    fn is_staff(&self, actor: &ActorId) -> bool;
}

/// Fails with [`RentalError::Forbidden`] unless `actor` is staff.
///
/// # Errors
///
/// Returns [`RentalError::Forbidden`] for non-staff actors.
pub fn require_staff(roles: &dyn StaffRoleCheck, actor: &ActorId) -> Result<(), RentalError> {
    if roles.is_staff(actor) {
        return Ok(());
    }
    tracing::warn!(%actor, "staff operation refused");
    Err(RentalError::Forbidden(actor.clone()))
}

/// Fixed set of staff actors.
#[derive(Debug, Clone, Default)]
pub struct StaffRoster {
    members: HashSet<ActorId>,
}

impl StaffRoster {
    /// Creates a roster from the given actors.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }
}

impl StaffRoleCheck for StaffRoster {
    fn is_staff(&self, actor: &ActorId) -> bool {
        self.members.contains(actor)
    }
}
