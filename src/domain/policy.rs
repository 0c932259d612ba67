//! Role-gated access policy.
//!
//! One pure predicate over (role, operation, context), consulted by every
//! mutating operation before it touches state. Keeping it free of entity
//! lookups means denial can never leave a partial write behind, and the rule
//! table is unit-testable in isolation.

use crate::domain::users::Role;

/// Operations subject to the access policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    CreateUser,
    UpdateUser,
    ListUsers,
    CreateChore,
    MarkDone,
    ApproveChore,
    RejectChore,
    ApprovalsQueue,
    CreateReward,
    UpdateReward,
    RequestRedemption,
    DecideRedemption,
    AdjustPoints,
    ViewLedger,
}

/// Actor-to-target relationships the rules depend on.
#[derive(Copy, Clone, Debug, Default)]
pub struct PolicyContext {
    /// Actor is in the target chore's assignee set.
    pub is_assignee: bool,
    /// Target user of the operation is the actor itself.
    pub is_self: bool,
}

impl PolicyContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn assignee() -> Self {
        Self {
            is_assignee: true,
            ..Self::default()
        }
    }

    pub fn own() -> Self {
        Self {
            is_self: true,
            ..Self::default()
        }
    }
}

pub fn is_allowed(role: Role, op: Operation, ctx: &PolicyContext) -> bool {
    use Operation::*;
    match op {
        CreateUser | UpdateUser => role == Role::Admin,
        ListUsers | CreateChore | ApproveChore | RejectChore | ApprovalsQueue | CreateReward
        | UpdateReward | DecideRedemption | AdjustPoints => {
            matches!(role, Role::Admin | Role::Parent)
        }
        MarkDone => role == Role::Child && ctx.is_assignee,
        RequestRedemption => role == Role::Child && ctx.is_self,
        ViewLedger => match role {
            Role::Child => ctx.is_self,
            Role::Parent | Role::Admin => true,
        },
    }
}
