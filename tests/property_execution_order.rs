//! Property tests for deterministic DAG ordering and scheduling.

use proptest::prelude::*;
use std::collections::HashSet;
use taskforge::domain::models::{Task, TaskGraph};
use taskforge::services::TaskMaster;
use uuid::Uuid;

/// Build an acyclic graph: task `i` may only depend on tasks with a smaller
/// index, with edges chosen pseudo-randomly from the seed.
fn acyclic_graph(size: usize, density: u64, seed: u64) -> TaskGraph {
    let ids: Vec<String> = (0..size).map(|i| format!("task-{i:02}")).collect();
    let mut tasks = Vec::with_capacity(size);

    for (i, id) in ids.iter().enumerate() {
        let mut task = Task::new(id, format!("Generated task {i}"));
        for (j, dep) in ids.iter().enumerate().take(i) {
            // Cheap deterministic hash of (i, j, seed).
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(((i as u64) << 32) | (j as u64))
                .wrapping_mul(1442695040888963407);
            if h % 100 < density {
                task = task.with_dependency(dep);
            }
        }
        tasks.push(task);
    }

    TaskGraph::new(Uuid::new_v4(), tasks)
}

proptest! {
    /// Property: the execution order is a permutation of the task ids.
    #[test]
    fn prop_order_is_a_permutation(
        size in 1usize..20,
        density in 0u64..60,
        seed in any::<u64>(),
    ) {
        let graph = acyclic_graph(size, density, seed);
        let order = graph.execution_order().unwrap();

        prop_assert_eq!(order.len(), size);
        let unique: HashSet<&String> = order.iter().collect();
        prop_assert_eq!(unique.len(), size);
    }

    /// Property: every dependency precedes its dependent.
    #[test]
    fn prop_order_is_topological(
        size in 1usize..20,
        density in 0u64..60,
        seed in any::<u64>(),
    ) {
        let graph = acyclic_graph(size, density, seed);
        let order = graph.execution_order().unwrap();
        let position: std::collections::HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        for task in &graph.tasks {
            for dep in &task.dependencies {
                prop_assert!(
                    position[dep.as_str()] < position[task.id.as_str()],
                    "dependency {} must precede {}",
                    dep,
                    task.id
                );
            }
        }
    }

    /// Property: ordering is independent of the declaration order of tasks.
    #[test]
    fn prop_order_is_deterministic(
        size in 1usize..20,
        density in 0u64..60,
        seed in any::<u64>(),
    ) {
        let graph = acyclic_graph(size, density, seed);
        let order = graph.execution_order().unwrap();

        let mut reversed_tasks = graph.tasks.clone();
        reversed_tasks.reverse();
        let reversed = TaskGraph::new(graph.session_id, reversed_tasks);

        prop_assert_eq!(reversed.execution_order().unwrap(), order);
    }

    /// Property: draining the task master schedules every task exactly once
    /// and never before its dependencies completed.
    #[test]
    fn prop_scheduler_respects_dependencies(
        size in 1usize..15,
        density in 0u64..60,
        seed in any::<u64>(),
    ) {
        let graph = acyclic_graph(size, density, seed);
        let tasks = graph.tasks.clone();
        let mut master = TaskMaster::new(0);
        master.enqueue(graph).unwrap();

        let mut completed: HashSet<String> = HashSet::new();
        while let Some(task) = master.schedule_next() {
            for dep in &task.dependencies {
                prop_assert!(completed.contains(dep), "{} ran before {}", task.id, dep);
            }
            master.mark_done(&task.id, serde_json::Value::Null).unwrap();
            prop_assert!(completed.insert(task.id.clone()));
        }

        prop_assert_eq!(completed.len(), tasks.len());
        prop_assert!(master.status_summary().is_complete());
    }
}
