//! Task definition documents and the revision references derived from them.

use aws_sdk_ecs::types::TaskDefinition;
use std::fmt;

/// Fields ECS fills in on registration. `RegisterTaskDefinition` rejects a
/// document that still carries them.
pub const SERVER_ASSIGNED_FIELDS: [&str; 7] = [
    "revision",
    "taskDefinitionArn",
    "status",
    "requiresAttributes",
    "registeredBy",
    "registeredAt",
    "compatibilities",
];

/// Names of the server-assigned fields still set on `task_definition`, in
/// [`SERVER_ASSIGNED_FIELDS`] order.
pub fn server_assigned_fields(task_definition: &TaskDefinition) -> Vec<&'static str> {
    let present = [
        task_definition.revision != 0,
        task_definition.task_definition_arn.is_some(),
        task_definition.status.is_some(),
        task_definition.requires_attributes.is_some(),
        task_definition.registered_by.is_some(),
        task_definition.registered_at.is_some(),
        task_definition.compatibilities.is_some(),
    ];

    SERVER_ASSIGNED_FIELDS
        .iter()
        .zip(present)
        .filter_map(|(field, set)| set.then_some(*field))
        .collect()
}

/// Clears every server-assigned field and leaves the rest of the document
/// untouched. Applying it to an already sanitized document is a no-op.
pub fn sanitize(mut task_definition: TaskDefinition) -> TaskDefinition {
    // 0 is what the SDK uses for an unset revision
    task_definition.revision = 0;
    task_definition.task_definition_arn = None;
    task_definition.status = None;
    task_definition.requires_attributes = None;
    task_definition.registered_by = None;
    task_definition.registered_at = None;
    task_definition.compatibilities = None;
    task_definition
}

/// A `family:revision` reference to one registered task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRef {
    family: String,
    revision: i32,
}

impl RevisionRef {
    pub fn new(family: impl Into<String>, revision: i32) -> Self {
        Self {
            family: family.into(),
            revision,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> i32 {
        self.revision
    }

    /// The revision registered just before this one. Assumes ECS hands out
    /// consecutive numbers, which concurrent registrations can break.
    pub fn previous(&self) -> Option<Self> {
        (self.revision > 1).then(|| Self::new(self.family.clone(), self.revision - 1))
    }
}

impl fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}
