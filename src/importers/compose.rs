//! Composition of manifests and locks produced by several importers.

use crate::core::lock::Lock;
use crate::core::manifest::Manifest;

/// Overlay `overlay` onto `base`.
///
/// Constraints and overrides from `overlay` replace those for the same
/// root. Ignored and required lists are unioned, keeping first-seen order.
pub fn merge_manifests(mut base: Manifest, overlay: Manifest) -> Manifest {
    base.constraints.extend(overlay.constraints);
    base.overrides.extend(overlay.overrides);
    union_into(&mut base.ignored, overlay.ignored);
    union_into(&mut base.required, overlay.required);
    base
}

/// Overlay `overlay` onto `base`, replacing locked projects by root.
pub fn merge_locks(mut base: Lock, overlay: Lock) -> Lock {
    for project in overlay.projects().iter().cloned() {
        base.upsert(project);
    }
    base
}

fn union_into(into: &mut Vec<String>, from: Vec<String>) {
    for item in from {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}
