//! Decoding and encoding invariant checks for fuzz testing

use opclw_dashboard::accounts::{TaskRecord, TaskStatus, FIELD_PRESENT};
use opclw_dashboard::config::{discriminators, MAX_MIN_REPUTATION};
use opclw_dashboard::instructions::CreateTaskArgs;

use crate::arbitrary::TaskAccountInput;

/// Task account decode invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeInvariantResult {
    Valid,
    FieldMismatch { field: &'static str },
    StatusNotNormalized { byte: u8, decoded: TaskStatus },
    OptionalFieldMismatch { field: &'static str, flag: u8 },
}

/// Create-task payload invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadInvariantResult {
    Valid,
    WrongDiscriminator,
    LengthMismatch { expected: usize, actual: usize },
    ReputationNotClamped { encoded: u8 },
    FieldMismatch { field: &'static str },
}

/// Status transition invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionInvariantResult {
    Valid,
    TerminalStateModified { from: TaskStatus, to: TaskStatus },
    SkippedInProgress,
    LifecycleMismatch { from: TaskStatus, to: TaskStatus, allowed: bool },
}

impl TransitionInvariantResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Open → InProgress → Completed, or Open → Cancelled.
pub const LIFECYCLE: [(TaskStatus, TaskStatus); 3] = [
    (TaskStatus::Open, TaskStatus::InProgress),
    (TaskStatus::InProgress, TaskStatus::Completed),
    (TaskStatus::Open, TaskStatus::Cancelled),
];

impl DecodeInvariantResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl PayloadInvariantResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A decoded task must carry exactly what was encoded, with out-of-range
/// status bytes read as `Open`.
pub fn check_task_decode(input: &TaskAccountInput, record: &TaskRecord) -> DecodeInvariantResult {
    if record.creator.to_bytes() != input.creator {
        return DecodeInvariantResult::FieldMismatch { field: "creator" };
    }
    if record.title != input.title {
        return DecodeInvariantResult::FieldMismatch { field: "title" };
    }
    if record.description != input.description {
        return DecodeInvariantResult::FieldMismatch { field: "description" };
    }
    if record.reward != input.reward {
        return DecodeInvariantResult::FieldMismatch { field: "reward" };
    }
    if record.deadline != input.deadline {
        return DecodeInvariantResult::FieldMismatch { field: "deadline" };
    }
    if record.skills != input.skills {
        return DecodeInvariantResult::FieldMismatch { field: "skills" };
    }
    if record.min_reputation != input.min_reputation {
        return DecodeInvariantResult::FieldMismatch { field: "min_reputation" };
    }
    if record.created_at != input.created_at {
        return DecodeInvariantResult::FieldMismatch { field: "created_at" };
    }

    let expected_status = TaskStatus::from_index(input.status).unwrap_or(TaskStatus::Open);
    if record.status != expected_status {
        return DecodeInvariantResult::StatusNotNormalized {
            byte: input.status,
            decoded: record.status,
        };
    }

    let expected_agent = (input.assigned_flag == FIELD_PRESENT).then_some(input.assigned_agent);
    if record.assigned_agent.map(|key| key.to_bytes()) != expected_agent {
        return DecodeInvariantResult::OptionalFieldMismatch {
            field: "assigned_agent",
            flag: input.assigned_flag,
        };
    }
    let expected_completed = (input.completed_flag == FIELD_PRESENT).then_some(input.completed_at);
    if record.completed_at != expected_completed {
        return DecodeInvariantResult::OptionalFieldMismatch {
            field: "completed_at",
            flag: input.completed_flag,
        };
    }

    DecodeInvariantResult::Valid
}

/// Discriminator, exact length, and the trailing reputation byte.
pub fn check_create_task_payload(args: &CreateTaskArgs, data: &[u8]) -> PayloadInvariantResult {
    if data.len() < discriminators::CREATE_TASK.len()
        || data[..discriminators::CREATE_TASK.len()] != discriminators::CREATE_TASK
    {
        return PayloadInvariantResult::WrongDiscriminator;
    }

    let strings = 4 + args.title.len() + 4 + args.description.len();
    let skills = 4 + args.skills.iter().map(|s| 4 + s.len()).sum::<usize>();
    let expected = 8 + strings + 8 + 8 + skills + 1;
    if data.len() != expected {
        return PayloadInvariantResult::LengthMismatch {
            expected,
            actual: data.len(),
        };
    }

    let Some(&encoded) = data.last() else {
        return PayloadInvariantResult::LengthMismatch { expected, actual: 0 };
    };
    if encoded > MAX_MIN_REPUTATION {
        return PayloadInvariantResult::ReputationNotClamped { encoded };
    }
    if encoded != args.min_reputation.min(MAX_MIN_REPUTATION) {
        return PayloadInvariantResult::FieldMismatch { field: "min_reputation" };
    }

    let reward_at = 8 + strings;
    if data[reward_at..reward_at + 8] != args.reward.to_le_bytes() {
        return PayloadInvariantResult::FieldMismatch { field: "reward" };
    }

    PayloadInvariantResult::Valid
}

/// Terminal states never change, completion goes through InProgress, and
/// every other answer of `can_transition_to` agrees with [`LIFECYCLE`].
pub fn check_status_transition(from: TaskStatus, to: TaskStatus) -> TransitionInvariantResult {
    let allowed = from.can_transition_to(to);
    if allowed && from.is_terminal() {
        return TransitionInvariantResult::TerminalStateModified { from, to };
    }
    if allowed && from == TaskStatus::Open && to == TaskStatus::Completed {
        return TransitionInvariantResult::SkippedInProgress;
    }
    if allowed != LIFECYCLE.contains(&(from, to)) {
        return TransitionInvariantResult::LifecycleMismatch { from, to, allowed };
    }
    TransitionInvariantResult::Valid
}
