//! Post-condition checks on grouper output

use std::collections::{HashMap, HashSet};

use crate::error::{AnalysisError, Result};
use crate::graph::DependencyGraph;
use crate::grouping::aggregate_risk;
use crate::model::AtomicCommitGroup;

pub struct GroupValidator;

impl GroupValidator {
    /// Check that `groups` partition `expected` exactly and that every group
    /// reports the aggregated risk of its members.
    ///
    /// Lost, duplicated or invented files are `GroupingInvariant` failures;
    /// empty groups and wrong risk levels are `Validation` failures.
    pub fn validate(
        groups: &[AtomicCommitGroup],
        expected: &[String],
        graph: Option<&DependencyGraph>,
    ) -> Result<()> {
        let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
        let mut owner: HashMap<&str, &str> = HashMap::new();

        for group in groups {
            if group.is_empty() {
                return Err(AnalysisError::Validation {
                    reason: format!("{} has no files", group.id),
                });
            }

            for file in &group.files {
                if !expected_set.contains(file.as_str()) {
                    return Err(AnalysisError::GroupingInvariant {
                        reason: format!("{} contains {}, which is not a changed file", group.id, file),
                    });
                }
                if let Some(previous) = owner.insert(file.as_str(), group.id.as_str()) {
                    return Err(AnalysisError::GroupingInvariant {
                        reason: format!("{} appears in both {} and {}", file, previous, group.id),
                    });
                }
            }

            let risk = aggregate_risk(graph, &group.files);
            if group.estimated_risk != risk {
                return Err(AnalysisError::Validation {
                    reason: format!(
                        "{} reports {} risk, members aggregate to {}",
                        group.id, group.estimated_risk, risk
                    ),
                });
            }
        }

        let missing: Vec<&str> = expected
            .iter()
            .map(String::as_str)
            .filter(|path| !owner.contains_key(path))
            .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::GroupingInvariant {
                reason: format!("changed files missing from every group: {}", missing.join(", ")),
            });
        }

        tracing::debug!("Validated {} groups covering {} files", groups.len(), owner.len());
        Ok(())
    }
}
