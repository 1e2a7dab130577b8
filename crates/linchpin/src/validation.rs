//! Structural and cycle validation for dependency edges.
//!
//! Checks run in a fixed order and stop at the first error:
//!
//! 1. self-dependency
//! 2. duplicate ordered pair
//! 3. dangling reference (unknown work item)
//! 4. cycle, or exhausted cycle search
//!
//! Schedule warnings are independent of the error checks. They never block a
//! write and are collected even for rejected edges.

use crate::config::EngineConfig;
use crate::domain::{DependencyEdge, DependencyType, NewDependency, WorkItem, WorkItemId};
use crate::error::{join_ids, ErrorCode, ValidationError};
use crate::graph::{CycleCheck, CycleDetector, ReachabilityIndex};
use chrono::TimeDelta;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Known work items, keyed by id.
pub type ItemMap = HashMap<WorkItemId, WorkItem>;

/// The parts of an edge that validation looks at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The dependent
    pub from_id: &'a WorkItemId,
    /// The prerequisite
    pub to_id: &'a WorkItemId,
    /// Anchor semantics
    pub dependency_type: DependencyType,
    /// Lag in days
    pub lag_days: i32,
}

impl<'a> From<&'a DependencyEdge> for Candidate<'a> {
    fn from(edge: &'a DependencyEdge) -> Self {
        Self {
            from_id: &edge.from_id,
            to_id: &edge.to_id,
            dependency_type: edge.dependency_type,
            lag_days: edge.lag_days,
        }
    }
}

impl<'a> From<&'a NewDependency> for Candidate<'a> {
    fn from(input: &'a NewDependency) -> Self {
        Self {
            from_id: &input.from_id,
            to_id: &input.to_id,
            dependency_type: input.dependency_type,
            lag_days: input.lag_days,
        }
    }
}

/// One blocking problem with an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Failure code
    pub code: ErrorCode,
    /// Which input field the problem is attributed to (`fromId` or `toId`)
    pub field: String,
    /// Human-readable explanation
    pub message: String,
    /// Dependent side of the edge
    pub from_id: WorkItemId,
    /// Prerequisite side of the edge
    pub to_id: WorkItemId,
    /// For cycles, the closing chain
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<WorkItemId>,
}

impl From<ValidationIssue> for ValidationError {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            code: issue.code,
            from_id: issue.from_id,
            to_id: issue.to_id,
            message: issue.message,
            path: issue.path,
        }
    }
}

/// A non-blocking schedule concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    /// Human-readable explanation
    pub message: String,
    /// Dependent side of the edge
    pub from_id: WorkItemId,
    /// Prerequisite side of the edge
    pub to_id: WorkItemId,
}

/// Outcome of validating one or more edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when `errors` is empty
    pub is_valid: bool,
    /// Blocking problems, in input order
    pub errors: Vec<ValidationIssue>,
    /// Schedule concerns, in input order
    pub warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    fn reject(&mut self, issue: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(issue);
    }

    /// The first error as a [`ValidationError`], if any.
    #[must_use]
    pub fn first_error(&self) -> Option<ValidationError> {
        self.errors.first().cloned().map(ValidationError::from)
    }
}

/// Validates candidate edges against a snapshot of the graph.
#[derive(Debug, Clone)]
pub struct ValidationService {
    detector: CycleDetector,
    index_threshold: usize,
    lag_warnings: bool,
}

impl Default for ValidationService {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ValidationService {
    /// Create a validator from engine settings.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            detector: CycleDetector::new(config.max_traversal_depth),
            index_threshold: config.reachability_index_threshold,
            lag_warnings: config.lag_warnings,
        }
    }

    /// The cycle detector this service uses.
    #[must_use]
    pub fn detector(&self) -> CycleDetector {
        self.detector
    }

    /// Whether a snapshot of `edge_count` edges should be checked through a
    /// [`ReachabilityIndex`].
    #[must_use]
    pub fn prefers_index(&self, edge_count: usize) -> bool {
        edge_count >= self.index_threshold
    }

    /// Validate one candidate against the existing edges.
    #[must_use]
    pub fn validate_new(
        &self,
        existing: &[DependencyEdge],
        candidate: Candidate<'_>,
        items: &ItemMap,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        let duplicate = existing
            .iter()
            .any(|e| e.pair() == (candidate.from_id, candidate.to_id));
        self.check_structure(candidate, duplicate, items, &mut result);
        if result.is_valid {
            let check = self.detector.check(existing, candidate.from_id, candidate.to_id);
            self.check_cycle(candidate, check, &mut result);
        }
        result
    }

    /// Validate one candidate, answering the cycle question from `index`.
    ///
    /// `index` must describe exactly `existing`.
    #[must_use]
    pub fn validate_new_indexed(
        &self,
        existing: &[DependencyEdge],
        index: &mut ReachabilityIndex,
        candidate: Candidate<'_>,
        items: &ItemMap,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        let duplicate = existing
            .iter()
            .any(|e| e.pair() == (candidate.from_id, candidate.to_id));
        self.check_structure(candidate, duplicate, items, &mut result);
        if result.is_valid {
            let check = index.check(candidate.from_id, candidate.to_id, self.detector.max_depth());
            self.check_cycle(candidate, check, &mut result);
        }
        result
    }

    /// Validate a batch of edges as if inserted one by one in order.
    ///
    /// Each edge is checked against the edges accepted before it. Rejected
    /// edges are left out of the accepted set, so later edges are judged as
    /// if the rejected ones had never been proposed.
    #[must_use]
    pub fn validate(&self, edges: &[DependencyEdge], items: &ItemMap) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mut accepted: Vec<DependencyEdge> = Vec::with_capacity(edges.len());
        let mut pairs: HashSet<(&WorkItemId, &WorkItemId)> = HashSet::with_capacity(edges.len());
        let mut index = self
            .prefers_index(edges.len())
            .then(|| ReachabilityIndex::build(&[]));

        for edge in edges {
            let candidate = Candidate::from(edge);
            let mut single = ValidationResult::default();
            self.check_structure(candidate, pairs.contains(&edge.pair()), items, &mut single);
            if single.is_valid {
                let check = match index.as_mut() {
                    Some(index) => index.check(&edge.from_id, &edge.to_id, self.detector.max_depth()),
                    None => self.detector.check(&accepted, &edge.from_id, &edge.to_id),
                };
                self.check_cycle(candidate, check, &mut single);
            }

            if single.is_valid {
                pairs.insert(edge.pair());
                if let Some(index) = index.as_mut() {
                    index.add_edge(&edge.from_id, &edge.to_id);
                }
                accepted.push(edge.clone());
            }

            result.is_valid &= single.is_valid;
            result.errors.extend(single.errors);
            result.warnings.extend(single.warnings);
        }

        result
    }

    fn check_structure(
        &self,
        candidate: Candidate<'_>,
        duplicate: bool,
        items: &ItemMap,
        result: &mut ValidationResult,
    ) {
        let Candidate { from_id, to_id, .. } = candidate;

        if let (Some(dependent), Some(prerequisite)) = (items.get(from_id), items.get(to_id)) {
            if self.lag_warnings {
                result
                    .warnings
                    .extend(schedule_warnings(candidate, dependent, prerequisite));
            }
        }

        if from_id == to_id {
            result.reject(issue(
                ErrorCode::SelfDependency,
                "toId",
                format!("{from_id} cannot depend on itself"),
                candidate,
            ));
        } else if duplicate {
            result.reject(issue(
                ErrorCode::DuplicateDependency,
                "toId",
                format!("{from_id} already depends on {to_id}"),
                candidate,
            ));
        } else if let Some((field, missing)) = [("fromId", from_id), ("toId", to_id)]
            .into_iter()
            .find(|(_, id)| !items.contains_key(*id))
        {
            result.reject(issue(
                ErrorCode::DanglingReference,
                field,
                format!("unknown work item {missing}"),
                candidate,
            ));
        }
    }

    fn check_cycle(&self, candidate: Candidate<'_>, check: CycleCheck, result: &mut ValidationResult) {
        match check {
            CycleCheck::Acyclic => {}
            CycleCheck::Cycle { path } => {
                let mut rejected = issue(
                    ErrorCode::CircularDependency,
                    "toId",
                    format!("would create a cycle through {}", join_ids(&path)),
                    candidate,
                );
                rejected.path = path;
                result.reject(rejected);
            }
            CycleCheck::DepthLimitExceeded { max_depth } => {
                result.reject(issue(
                    ErrorCode::DepthLimitExceeded,
                    "toId",
                    format!(
                        "dependency chain from {} is deeper than {max_depth} hops; cannot rule out a cycle",
                        candidate.to_id
                    ),
                    candidate,
                ));
            }
        }
    }
}

fn issue(code: ErrorCode, field: &str, message: String, candidate: Candidate<'_>) -> ValidationIssue {
    ValidationIssue {
        code,
        field: field.to_string(),
        message,
        from_id: candidate.from_id.clone(),
        to_id: candidate.to_id.clone(),
        path: Vec::new(),
    }
}

fn schedule_warnings(
    candidate: Candidate<'_>,
    dependent: &WorkItem,
    prerequisite: &WorkItem,
) -> Vec<ValidationWarning> {
    let warn = |message: String| ValidationWarning {
        message,
        from_id: candidate.from_id.clone(),
        to_id: candidate.to_id.clone(),
    };
    let lag = candidate.lag_days;
    let duration = i64::from(prerequisite.duration_days);
    let mut warnings = Vec::new();

    if i64::from(lag) > duration {
        warnings.push(warn(format!(
            "lag of {lag} days exceeds the {duration}-day duration of {}",
            prerequisite.id
        )));
    } else if -i64::from(lag) > duration {
        warnings.push(warn(format!(
            "lead of {} days exceeds the {duration}-day duration of {}",
            -i64::from(lag),
            prerequisite.id
        )));
    }

    if let (Some(due), Some(prerequisite_due)) = (dependent.due_date, prerequisite.due_date) {
        if let Some(earliest) = prerequisite_due.checked_add_signed(TimeDelta::days(i64::from(lag))) {
            if due < earliest {
                warnings.push(warn(format!(
                    "{} is due {due}, before {} ({prerequisite_due}) plus {lag} days",
                    dependent.id, prerequisite.id
                )));
            }
        }
    }

    warnings
}
