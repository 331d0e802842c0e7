//! Task graph: the immutable-once-validated DAG for one session.
//!
//! Provides issue-collecting validation, DFS cycle detection, and a
//! deterministic topological order (Kahn's algorithm with lexicographic
//! tie-breaking) so downstream retries are replayable.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::task::Task;

/// Dependency graph of tasks for one session.
///
/// Created by the planning stage, validated once via [`TaskGraph::validate`],
/// then read-only for the lifetime of execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskGraph {
    /// Session this graph belongs to.
    pub session_id: Uuid,
    /// Ordered list of tasks as produced by planning.
    pub tasks: Vec<Task>,
    /// Free-form planning metadata (plan name, seed, etc.).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TaskGraph {
    pub fn new(session_id: Uuid, tasks: Vec<Task>) -> Self {
        Self {
            session_id,
            tasks,
            metadata: HashMap::new(),
        }
    }

    /// Look up a task by id.
    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate the graph.
    ///
    /// Collects every structural issue (duplicate ids, dangling or self
    /// dependencies, per-task problems) before failing, then runs cycle
    /// detection. Returns `GraphValidation` for structural issues and
    /// `DependencyCycle` for cycles.
    pub fn validate(&self) -> DomainResult<()> {
        let mut issues = Vec::new();

        let mut seen: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                issues.push(format!("duplicate task id '{}'", task.id));
            }
            if let Err(e) = task.validate() {
                issues.push(e);
            }
        }

        let ids: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        for task in &self.tasks {
            for dep in &task.dependencies {
                if !ids.contains(dep.as_str()) {
                    issues.push(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.id, dep
                    ));
                }
            }
        }

        if !issues.is_empty() {
            return Err(DomainError::GraphValidation(issues));
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(DomainError::DependencyCycle(cycle));
        }

        Ok(())
    }

    /// Detect a dependency cycle, returning the cycle path if one exists.
    ///
    /// DFS tracking an in-progress set; a back-edge into the in-progress set
    /// signals a cycle.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let adjacency: HashMap<&str, &[String]> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.dependencies.as_slice()))
            .collect();

        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_progress: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();

        // Iterate tasks in declaration order so the reported cycle is stable.
        for task in &self.tasks {
            if !visited.contains(task.id.as_str())
                && dfs_cycle(
                    task.id.as_str(),
                    &adjacency,
                    &mut visited,
                    &mut in_progress,
                    &mut path,
                )
            {
                return Some(path.into_iter().map(String::from).collect());
            }
        }

        None
    }

    /// Compute the deterministic topological execution order.
    ///
    /// Kahn's algorithm: maintain in-degree counts (a task's in-degree is its
    /// unsatisfied dependency count), seed with zero-in-degree tasks, and at
    /// each step pop the lexicographically smallest ready id. A result
    /// shorter than the task count means the graph contains a cycle.
    pub fn execution_order(&self) -> DomainResult<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for task in &self.tasks {
            in_degree.insert(task.id.as_str(), task.dependencies.len());
            for dep in &task.dependencies {
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(task.id.as_str());
            }
        }

        // Min-heap keyed on the id itself gives the lexicographic tie-break.
        let mut ready: BinaryHeap<Reverse<&str>> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&id, _)| Reverse(id))
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(self.tasks.len());

        while let Some(Reverse(id)) = ready.pop() {
            order.push(id.to_string());
            if let Some(children) = dependents.get(id) {
                for &child in children {
                    let degree = in_degree
                        .get_mut(child)
                        .ok_or_else(|| DomainError::TaskNotFound(child.to_string()))?;
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(child));
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            let cycle = self.detect_cycle().unwrap_or_default();
            return Err(DomainError::DependencyCycle(cycle));
        }

        Ok(order)
    }

    /// Tasks whose full dependency set is contained in `completed` and which
    /// are not already active (running) or terminal (completed/failed).
    pub fn ready_tasks(
        &self,
        completed: &HashSet<String>,
        running: &HashSet<String>,
        failed: &HashSet<String>,
    ) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| {
                !completed.contains(&t.id)
                    && !running.contains(&t.id)
                    && !failed.contains(&t.id)
                    && t.dependencies.iter().all(|d| completed.contains(d))
            })
            .collect()
    }

    /// Build the dependency -> dependents adjacency map used for skip
    /// propagation. Built once per graph.
    pub fn dependents_map(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for task in &self.tasks {
            for dep in &task.dependencies {
                map.entry(dep.clone()).or_default().push(task.id.clone());
            }
        }
        map
    }
}

fn dfs_cycle<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, &'a [String]>,
    visited: &mut HashSet<&'a str>,
    in_progress: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    in_progress.insert(node);
    path.push(node);

    if let Some(deps) = adjacency.get(node) {
        for dep in deps.iter() {
            let dep = dep.as_str();
            if !visited.contains(dep) {
                if dfs_cycle(dep, adjacency, visited, in_progress, path) {
                    return true;
                }
            } else if in_progress.contains(dep) {
                // Trim the prefix so the path starts at the cycle entry and
                // close the loop for readable error messages.
                if let Some(start) = path.iter().position(|&id| id == dep) {
                    path.drain(0..start);
                }
                path.push(dep);
                return true;
            }
        }
    }

    in_progress.remove(node);
    path.pop();
    false
}
