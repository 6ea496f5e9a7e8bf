//! Explicit task graph.
//!
//! Tasks are declared in dependency order: an edge may only point at a task
//! declared earlier, so a graph that builds is acyclic.

use std::fmt;

use thiserror::Error;

/// A unit of build work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Sprites,
    Styles,
    Scripts,
    CacheBust,
}

impl TaskId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sprites => "sprites",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::CacheBust => "cachebust",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a task depends on an upstream task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Upstream must succeed; otherwise the dependent is skipped.
    Requires,
    /// Upstream must merely finish.
    After,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task `{0}` declared twice")]
    Duplicate(TaskId),
    #[error("task `{task}` depends on undeclared task `{dependency}`")]
    UnknownDependency { task: TaskId, dependency: TaskId },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: TaskId,
    pub deps: Vec<(TaskId, Edge)>,
}

/// Dependency graph in declaration (topological) order.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: Vec<Node>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full build: `sprites -> {styles, scripts} -> cachebust`.
    pub fn pipeline() -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph
            .add(TaskId::Sprites, &[])?
            .add(TaskId::Styles, &[(TaskId::Sprites, Edge::Requires)])?
            .add(TaskId::Scripts, &[(TaskId::Sprites, Edge::Requires)])?
            .add(
                TaskId::CacheBust,
                &[(TaskId::Styles, Edge::After), (TaskId::Scripts, Edge::After)],
            )?;
        Ok(graph)
    }

    /// Declare a task. Dependencies must already be declared.
    pub fn add(&mut self, id: TaskId, deps: &[(TaskId, Edge)]) -> Result<&mut Self, GraphError> {
        if self.contains(id) {
            return Err(GraphError::Duplicate(id));
        }
        if let Some(&(dependency, _)) = deps.iter().find(|(dep, _)| !self.contains(*dep)) {
            return Err(GraphError::UnknownDependency {
                task: id,
                dependency,
            });
        }
        self.nodes.push(Node {
            id,
            deps: deps.to_vec(),
        });
        Ok(self)
    }

    /// Keep only `keep`, dropping edges to tasks outside it.
    pub fn subset(&self, keep: &[TaskId]) -> Self {
        let nodes = self
            .nodes
            .iter()
            .filter(|node| keep.contains(&node.id))
            .map(|node| Node {
                id: node.id,
                deps: node
                    .deps
                    .iter()
                    .filter(|(dep, _)| keep.contains(dep))
                    .copied()
                    .collect(),
            })
            .collect();
        Self { nodes }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_shape() {
        let graph = TaskGraph::pipeline().unwrap();
        let ids: Vec<_> = graph.ids().collect();
        assert_eq!(
            ids,
            [TaskId::Sprites, TaskId::Styles, TaskId::Scripts, TaskId::CacheBust]
        );

        let cachebust = &graph.nodes()[3];
        assert_eq!(
            cachebust.deps,
            [(TaskId::Styles, Edge::After), (TaskId::Scripts, Edge::After)]
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut graph = TaskGraph::new();
        let err = graph
            .add(TaskId::Styles, &[(TaskId::Sprites, Edge::Requires)])
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                task: TaskId::Styles,
                dependency: TaskId::Sprites
            }
        );
    }

    #[test]
    fn test_cycle_rejected() {
        // a -> b -> a cannot be expressed: the second edge points forward.
        let mut graph = TaskGraph::new();
        graph.add(TaskId::Styles, &[]).unwrap();
        graph
            .add(TaskId::Scripts, &[(TaskId::Styles, Edge::After)])
            .unwrap();
        assert_eq!(
            graph
                .add(TaskId::Styles, &[(TaskId::Scripts, Edge::After)])
                .unwrap_err(),
            GraphError::Duplicate(TaskId::Styles)
        );
        // Self-edge
        assert!(matches!(
            graph.add(TaskId::CacheBust, &[(TaskId::CacheBust, Edge::After)]),
            Err(GraphError::UnknownDependency { .. })
        ));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_subset_drops_outside_edges() {
        let graph = TaskGraph::pipeline()
            .unwrap()
            .subset(&[TaskId::Scripts, TaskId::CacheBust]);
        assert_eq!(graph.len(), 2);

        let scripts = &graph.nodes()[0];
        assert_eq!(scripts.id, TaskId::Scripts);
        assert!(scripts.deps.is_empty());

        let cachebust = &graph.nodes()[1];
        assert_eq!(cachebust.deps, [(TaskId::Scripts, Edge::After)]);
    }

    #[test]
    fn test_subset_empty() {
        assert!(TaskGraph::pipeline().unwrap().subset(&[]).is_empty());
    }
}
