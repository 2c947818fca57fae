//! Escalation target selection.

use crate::directory::Staff;
use crate::types::DbId;

/// Pick the staff member an escalated alert should be reassigned to.
///
/// Returns the first on-duty candidate whose id differs from
/// `current_assignee`. With no current assignee the first candidate wins.
/// `None` means nobody else is available; escalation still proceeds.
pub fn select_escalation_target(on_duty: &[Staff], current_assignee: Option<DbId>) -> Option<DbId> {
    on_duty
        .iter()
        .map(|s| s.id)
        .find(|id| Some(*id) != current_assignee)
}
