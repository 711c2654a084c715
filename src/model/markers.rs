//! Markers: named ranges kept up to date across operations
//!
//! Every applied operation is fed to [`MarkerCollection::apply_operation`],
//! which rebases each marker and reports what changed. A marker whose range
//! ends up in the graveyard is dropped from the collection.

use super::node::NodeId;
use super::operation::{Operation, OperationKind};
use super::position::Position;
use super::range::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Change of a single marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerChange {
    pub name: String,
    pub old_range: Option<Range>,
    pub new_range: Option<Range>, // None = marker removed

    /// Where the content was when it was removed, for markers that went to the graveyard.
    pub deletion_position: Option<Position>,
}

/// Named ranges of one document
#[derive(Debug, Clone, Default)]
pub struct MarkerCollection {
    markers: BTreeMap<String, Range>,
}

impl MarkerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a marker (returns the change to report)
    pub fn set(&mut self, name: impl Into<String>, range: Range) -> MarkerChange {
        let name = name.into();
        let old_range = self.markers.insert(name.clone(), range.clone());

        MarkerChange {
            name,
            old_range,
            new_range: Some(range),
            deletion_position: None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Range> {
        self.markers.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<MarkerChange> {
        let old_range = self.markers.remove(name)?;

        Some(MarkerChange {
            name: name.to_string(),
            old_range: Some(old_range),
            new_range: None,
            deletion_position: None,
        })
    }

    /// Markers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Range)> {
        self.markers.iter().map(|(name, range)| (name.as_str(), range))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Rebase every marker by an operation that was just applied.
    ///
    /// Only markers whose range changed are reported.
    pub fn apply_operation(&mut self, operation: &Operation) -> Vec<MarkerChange> {
        let mut changes = Vec::new();
        let mut removed = Vec::new();

        for (name, range) in self.markers.iter_mut() {
            // A stored range always yields at least one piece; an empty
            // result keeps the marker where it was.
            let pieces = range.get_transformed_by_operation(operation);
            let Ok(transformed) = Range::create_from_ranges(&pieces) else {
                tracing::debug!(
                    target: "docmodel::markers",
                    marker = %name,
                    kind = %operation.kind(),
                    "marker kept: transform produced no range"
                );
                continue;
            };

            if transformed == *range {
                continue;
            }

            if transformed.root() == NodeId::GRAVEYARD {
                let deletion_position = removal_position(operation);

                tracing::debug!(
                    target: "docmodel::markers",
                    marker = %name,
                    kind = %operation.kind(),
                    "marker removed with its content"
                );

                removed.push(name.clone());
                changes.push(MarkerChange {
                    name: name.clone(),
                    old_range: Some(range.clone()),
                    new_range: None,
                    deletion_position,
                });
                continue;
            }

            changes.push(MarkerChange {
                name: name.clone(),
                old_range: Some(range.clone()),
                new_range: Some(transformed.clone()),
                deletion_position: None,
            });
            *range = transformed;
        }

        for name in removed {
            self.markers.remove(&name);
        }

        changes
    }
}

/// Position the content occupied before an operation moved it to the graveyard.
fn removal_position(operation: &Operation) -> Option<Position> {
    match operation {
        Operation::Move(op) if op.kind() == OperationKind::Remove => Some(op.source_position.clone()),
        Operation::Merge(op) => Some(op.deletion_position()),
        _ => None,
    }
}
