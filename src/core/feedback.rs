//! Dependency feedback events.
//!
//! One event per classified dependency: the constraint chosen for it, or the
//! version it was locked to. Events render as console status lines and
//! serialize for machine-readable output.

use std::fmt;

use serde::Serialize;

use crate::core::constraint::Constraint;
use crate::core::lock::LockedProject;
use crate::core::project::ProjectRoot;
use crate::util::shell::{Shell, Status};

/// How a dependency entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    Direct,
    Transitive,
    Imported,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyType::Direct => f.write_str("direct dep"),
            DependencyType::Transitive => f.write_str("transitive dep"),
            DependencyType::Imported => f.write_str("imported dep"),
        }
    }
}

/// Whether a constraint constrains or only hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintType {
    Constraint,
    Hint,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Constraint => f.write_str("constraint"),
            ConstraintType::Hint => f.write_str("hint"),
        }
    }
}

/// A dependency classification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Feedback {
    Constraint {
        project: String,
        constraint: String,
        constraint_type: ConstraintType,
        dependency_type: DependencyType,
    },
    Locked {
        project: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
        dependency_type: DependencyType,
    },
}

impl Feedback {
    pub fn constraint(root: &ProjectRoot, constraint: &Constraint, dep_type: DependencyType) -> Self {
        let constraint_type = if constraint.is_hint() {
            ConstraintType::Hint
        } else {
            ConstraintType::Constraint
        };

        Feedback::Constraint {
            project: root.to_string(),
            constraint: constraint.to_string(),
            constraint_type,
            dependency_type: dep_type,
        }
    }

    pub fn locked(lp: &LockedProject, dep_type: DependencyType) -> Self {
        let version = lp.version();
        Feedback::Locked {
            project: lp.root().to_string(),
            version: version.unpaired().map(|v| v.to_string()),
            revision: version.revision().map(|r| r.short().to_string()),
            dependency_type: dep_type,
        }
    }

    /// Console status and message for this event.
    pub fn render(&self) -> (Status, String) {
        match self {
            Feedback::Constraint {
                project,
                constraint,
                constraint_type,
                dependency_type: DependencyType::Imported,
            } => (
                Status::Using,
                format!("{} as initial {} for imported dep {}", constraint, constraint_type, project),
            ),
            Feedback::Constraint {
                project,
                constraint,
                constraint_type,
                dependency_type,
            } => (
                Status::Using,
                format!("{} as {} for {} {}", constraint, constraint_type, dependency_type, project),
            ),
            Feedback::Locked {
                project,
                version,
                revision,
                dependency_type: DependencyType::Imported,
            } => (
                Status::Locking,
                format!(
                    "{} ({}) as initial lock for imported dep {}",
                    version.as_deref().unwrap_or("*"),
                    revision.as_deref().unwrap_or(""),
                    project
                ),
            ),
            Feedback::Locked {
                project,
                version,
                revision,
                dependency_type,
            } => {
                let pinned = match (version, revision) {
                    (Some(v), Some(r)) => format!("{} ({})", v, r),
                    (Some(v), None) => v.clone(),
                    (None, Some(r)) => r.clone(),
                    (None, None) => "*".to_string(),
                };
                (
                    Status::Locking,
                    format!("{} for {} {}", pinned, dependency_type, project),
                )
            }
        }
    }

    pub fn log(&self, shell: &Shell) {
        let (status, message) = self.render();
        shell.status(status, message);
    }
}
