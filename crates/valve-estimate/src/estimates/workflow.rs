use serde::{Deserialize, Serialize};

/// Lifecycle of an estimate sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Draft,
    Requested,
    Processing,
    Completed,
    Ordered,
}

impl EstimateStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Draft,
            Self::Requested,
            Self::Processing,
            Self::Completed,
            Self::Ordered,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Requested => "requested",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Ordered => "ordered",
        }
    }
}

/// Who is driving a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Staff,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub name: String,
}

impl Actor {
    pub fn customer(name: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Customer,
            name: name.into(),
        }
    }

    pub fn staff(name: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Staff,
            name: name.into(),
        }
    }
}

/// Commands accepted by the status endpoint; each forward step has its undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Submit,
    CancelRequest,
    StartProcessing,
    RevertToRequested,
    Complete,
    RevertToProcessing,
    Order,
    CancelOrder,
}

impl StatusAction {
    pub const fn all() -> [Self; 8] {
        [
            Self::Submit,
            Self::CancelRequest,
            Self::StartProcessing,
            Self::RevertToRequested,
            Self::Complete,
            Self::RevertToProcessing,
            Self::Order,
            Self::CancelOrder,
        ]
    }

    /// `(from, to, permitted role)` for the action.
    pub const fn rule(self) -> (EstimateStatus, EstimateStatus, ActorRole) {
        use EstimateStatus::*;
        match self {
            Self::Submit => (Draft, Requested, ActorRole::Customer),
            Self::CancelRequest => (Requested, Draft, ActorRole::Customer),
            Self::StartProcessing => (Requested, Processing, ActorRole::Staff),
            Self::RevertToRequested => (Processing, Requested, ActorRole::Staff),
            Self::Complete => (Processing, Completed, ActorRole::Staff),
            Self::RevertToProcessing => (Completed, Processing, ActorRole::Staff),
            Self::Order => (Completed, Ordered, ActorRole::Customer),
            Self::CancelOrder => (Ordered, Completed, ActorRole::Customer),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::CancelRequest => "cancel_request",
            Self::StartProcessing => "start_processing",
            Self::RevertToRequested => "revert_to_requested",
            Self::Complete => "complete",
            Self::RevertToProcessing => "revert_to_processing",
            Self::Order => "order",
            Self::CancelOrder => "cancel_order",
        }
    }

    /// Resolves the target status, checking the current status and the actor's role.
    pub fn apply(self, current: EstimateStatus, role: ActorRole) -> Result<EstimateStatus, WorkflowError> {
        let (from, to, permitted) = self.rule();
        if current != from {
            return Err(WorkflowError::InvalidTransition {
                action: self,
                status: current,
            });
        }
        if role != permitted {
            return Err(WorkflowError::Forbidden {
                action: self,
                role,
            });
        }
        Ok(to)
    }

    /// Actions a given role may take from `status`, for UI button state.
    pub fn available(status: EstimateStatus, role: ActorRole) -> Vec<Self> {
        Self::all()
            .into_iter()
            .filter(|action| {
                let (from, _, permitted) = action.rule();
                from == status && permitted == role
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("cannot {} an estimate in status {}", .action.label(), .status.label())]
    InvalidTransition {
        action: StatusAction,
        status: EstimateStatus,
    },
    #[error("{} users may not {}", .role.label(), .action.label())]
    Forbidden { action: StatusAction, role: ActorRole },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_reaches_ordered() {
        let mut status = EstimateStatus::Draft;
        for (action, role) in [
            (StatusAction::Submit, ActorRole::Customer),
            (StatusAction::StartProcessing, ActorRole::Staff),
            (StatusAction::Complete, ActorRole::Staff),
            (StatusAction::Order, ActorRole::Customer),
        ] {
            status = action.apply(status, role).expect("forward step allowed");
        }
        assert_eq!(status, EstimateStatus::Ordered);
    }

    #[test]
    fn every_forward_step_has_an_undo() {
        for action in StatusAction::all() {
            let (from, to, _) = action.rule();
            assert!(
                StatusAction::all().iter().any(|other| {
                    let (other_from, other_to, _) = other.rule();
                    other_from == to && other_to == from
                }),
                "{} has no reverse action",
                action.label()
            );
        }
    }

    #[test]
    fn rejects_transition_from_wrong_status() {
        let err = StatusAction::Complete
            .apply(EstimateStatus::Requested, ActorRole::Staff)
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                action: StatusAction::Complete,
                status: EstimateStatus::Requested,
            }
        );
        assert_eq!(
            err.to_string(),
            "cannot complete an estimate in status requested"
        );
    }

    #[test]
    fn customers_cannot_start_processing() {
        let err = StatusAction::StartProcessing
            .apply(EstimateStatus::Requested, ActorRole::Customer)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));
    }

    #[test]
    fn available_actions_follow_role() {
        assert_eq!(
            StatusAction::available(EstimateStatus::Processing, ActorRole::Staff),
            vec![StatusAction::RevertToRequested, StatusAction::Complete]
        );
        assert!(StatusAction::available(EstimateStatus::Processing, ActorRole::Customer).is_empty());
        assert_eq!(
            StatusAction::available(EstimateStatus::Completed, ActorRole::Customer),
            vec![StatusAction::Order]
        );
    }
}
