//! Issue hierarchy as a graph: parent/child edges from sub-issues and
//! blocked-by edges from dependency lines.

use crate::error::{AnokyeError, Result};
use crate::model::{Issue, IssueState, IssueType};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub closed: usize,
    pub total: usize,
    /// Closed share of `total`, rounded to one decimal.
    pub percent: f64,
}

impl Progress {
    fn new(closed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (closed as f64 * 1000.0 / total as f64).round() / 10.0
        };
        Self {
            closed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockedIssue {
    pub number: u64,
    pub title: String,
    /// Open issues this one is waiting on.
    pub blockers: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyReport {
    pub root: u64,
    pub progress: Progress,
    pub tree: TreeNode,
    pub ready: Vec<u64>,
    pub blocked: Vec<BlockedIssue>,
    /// Work order over the hierarchy; empty when the dependencies form a cycle.
    pub order: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueGraph {
    nodes: BTreeMap<u64, Issue>,
}

impl IssueGraph {
    pub fn new(issues: impl IntoIterator<Item = Issue>) -> Self {
        Self {
            nodes: issues.into_iter().map(|i| (i.number, i)).collect(),
        }
    }

    fn is_open(&self, number: u64) -> Option<bool> {
        self.nodes.get(&number).map(Issue::is_open)
    }

    /// Blockers known to be open. Unknown blockers do not block.
    fn open_blockers(&self, issue: &Issue) -> Vec<u64> {
        issue
            .blocked_by
            .iter()
            .copied()
            .filter(|b| self.is_open(*b) == Some(true))
            .collect()
    }

    fn has_open_children(&self, issue: &Issue) -> bool {
        issue
            .children
            .iter()
            .any(|c| self.is_open(*c) == Some(true))
    }

    /// `root` and every issue reachable through child edges, in number order.
    pub fn descendants(&self, root: u64) -> BTreeSet<u64> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(number) = stack.pop() {
            if !seen.insert(number) {
                continue;
            }
            if let Some(issue) = self.nodes.get(&number) {
                stack.extend(issue.children.iter().copied());
            }
        }
        seen.retain(|n| self.nodes.contains_key(n));
        seen
    }

    /// Open issues with nothing left in the way: every blocker closed
    /// and no open children.
    pub fn ready(&self) -> Vec<&Issue> {
        self.nodes
            .values()
            .filter(|i| i.is_open())
            .filter(|i| self.open_blockers(i).is_empty())
            .filter(|i| !self.has_open_children(i))
            .collect()
    }

    /// Open issues waiting on at least one open blocker.
    pub fn blocked(&self) -> Vec<BlockedIssue> {
        self.nodes
            .values()
            .filter(|i| i.is_open())
            .filter_map(|i| {
                let blockers = self.open_blockers(i);
                (!blockers.is_empty()).then(|| BlockedIssue {
                    number: i.number,
                    title: i.title.clone(),
                    blockers,
                })
            })
            .collect()
    }

    /// Closed leaves over all leaves beneath `number`.
    ///
    /// An issue whose children are all unknown counts as a leaf itself.
    pub fn progress(&self, number: u64) -> Option<Progress> {
        self.nodes.get(&number)?;
        let mut closed = 0;
        let mut total = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![number];

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(issue) = self.nodes.get(&current) else {
                continue;
            };
            let known: Vec<u64> = issue
                .children
                .iter()
                .copied()
                .filter(|c| self.nodes.contains_key(c))
                .collect();
            if known.is_empty() {
                total += 1;
                if !issue.is_open() {
                    closed += 1;
                }
            } else {
                stack.extend(known);
            }
        }
        Some(Progress::new(closed, total))
    }

    /// Completion percentage of `number`, rounded to one decimal.
    pub fn completion(&self, number: u64) -> Option<f64> {
        self.progress(number).map(|p| p.percent)
    }

    /// Kahn order over blocked-by edges: blockers come before the issues
    /// they block, ties broken by issue number.
    pub fn topological_order(&self) -> Result<Vec<u64>> {
        self.order_of(&self.nodes.keys().copied().collect())
    }

    fn order_of(&self, subset: &BTreeSet<u64>) -> Result<Vec<u64>> {
        let mut in_degree: BTreeMap<u64, usize> = subset.iter().map(|n| (*n, 0)).collect();
        let mut dependents: BTreeMap<u64, Vec<u64>> = BTreeMap::new();

        for number in subset {
            let issue = &self.nodes[number];
            let mut blockers: Vec<u64> = issue
                .blocked_by
                .iter()
                .copied()
                .filter(|b| subset.contains(b) && b != number)
                .collect();
            blockers.sort_unstable();
            blockers.dedup();
            for blocker in blockers {
                dependents.entry(blocker).or_default().push(*number);
                *in_degree.entry(*number).or_default() += 1;
            }
        }

        let mut queue: BTreeSet<u64> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(subset.len());

        while let Some(number) = queue.pop_first() {
            order.push(number);
            for dependent in dependents.get(&number).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.insert(*dependent);
                    }
                }
            }
        }

        if order.len() < subset.len() {
            let cycle = in_degree
                .into_iter()
                .filter(|(_, d)| *d > 0)
                .map(|(n, _)| n)
                .collect();
            return Err(AnokyeError::Cycle(cycle));
        }
        Ok(order)
    }

    fn tree(&self, number: u64, seen: &mut HashSet<u64>) -> Option<TreeNode> {
        let issue = self.nodes.get(&number)?;
        if !seen.insert(number) {
            return None;
        }
        let children = issue
            .children
            .iter()
            .filter_map(|c| self.tree(*c, seen))
            .collect();
        Some(TreeNode {
            number,
            title: issue.title.clone(),
            state: issue.state,
            issue_type: issue.issue_type.clone(),
            progress: self.progress(number)?,
            children,
        })
    }

    /// Progress, readiness and blocking for the hierarchy under `root`.
    pub fn report(&self, root: u64) -> Result<HierarchyReport> {
        let tree = self
            .tree(root, &mut HashSet::new())
            .ok_or_else(|| AnokyeError::NotFound(format!("issue #{}", root)))?;
        let scope = self.descendants(root);

        let (order, cycle) = match self.order_of(&scope) {
            Ok(order) => (order, Vec::new()),
            Err(AnokyeError::Cycle(cycle)) => (Vec::new(), cycle),
            Err(e) => return Err(e),
        };

        Ok(HierarchyReport {
            root,
            progress: tree.progress,
            ready: self
                .ready()
                .into_iter()
                .map(|i| i.number)
                .filter(|n| scope.contains(n))
                .collect(),
            blocked: self
                .blocked()
                .into_iter()
                .filter(|b| scope.contains(&b.number))
                .collect(),
            tree,
            order,
            cycle,
        })
    }
}
