// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dependency Graph Builder
//!
//! Turns a flat list of [`ServiceSpec`]s with `depends_on` references into a
//! validated dependency forest.
//!
//! # Build Steps
//!
//! Each step is a hard precondition for the next:
//!
//! 1. **Uniqueness:** service names unique across the fleet, process names
//!    unique within a service.
//! 2. **Adjacency:** edges point from a dependency to its dependents. A
//!    `depends_on` naming an unknown service is rejected here.
//! 3. **Cycle detection:** DFS from every unvisited node with a recursion
//!    stack.
//! 4. **Ordering:** depth-first pre-order from the roots, siblings in input
//!    order, so every dependency precedes its dependents.
//! 5. **Materialization:** `dependencies` / `dependents` back-references.
//!
//! Each service has at most one dependency, so the result is a forest rather
//! than a general DAG. Supporting fan-in would mean replacing step 4 with
//! Kahn's algorithm (stable input-order tie-break).

use std::collections::{HashMap, HashSet};

use crate::domain::fleet::{Service, ServiceId, ServiceSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    #[error("duplicate service name: {0}")]
    DuplicateServiceName(String),

    #[error("duplicate process name: {process} in service: {service}")]
    DuplicateProcessName { service: String, process: String },

    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    /// Cycle path in `depends_on` direction, first and last entries equal.
    #[error("cyclic dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}

impl GraphError {
    /// True for both duplicate service and duplicate process names.
    pub fn is_duplicate_name(&self) -> bool {
        matches!(
            self,
            GraphError::DuplicateServiceName(_) | GraphError::DuplicateProcessName { .. }
        )
    }
}

/// Validated dependency forest over a canonical service table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    services: Vec<Service>,
    index: HashMap<String, ServiceId>,
    order: Vec<ServiceId>,
    roots: Vec<ServiceId>,
}

impl Topology {
    /// Validate `specs` and build the dependency forest.
    ///
    /// No partial topology is ever returned: any [`GraphError`] aborts the
    /// whole build.
    pub fn build(specs: Vec<ServiceSpec>) -> Result<Self, GraphError> {
        validate_names(&specs)?;

        let index: HashMap<String, ServiceId> = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name.clone(), ServiceId(i)))
            .collect();

        let adjacency = build_adjacency(&specs, &index)?;
        check_for_cycles(&specs, &adjacency)?;
        let order = topological_order(&specs, &adjacency);

        let mut services: Vec<Service> = specs.into_iter().map(Service::from_spec).collect();
        for &id in &order {
            let Some(dep_id) = services[id.0].depends_on.as_deref().map(|d| index[d]) else {
                continue;
            };
            services[dep_id.0].dependents.push(id);
            services[id.0].dependencies.push(dep_id);
        }

        let roots = services
            .iter()
            .enumerate()
            .filter(|(_, s)| s.depends_on.is_none())
            .map(|(i, _)| ServiceId(i))
            .collect();

        Ok(Self {
            services,
            index,
            order,
            roots,
        })
    }

    /// All services in declaration order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: ServiceId) -> &Service {
        &self.services[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<ServiceId> {
        self.index.get(name).copied()
    }

    pub fn find(&self, name: &str) -> Option<&Service> {
        self.id_of(name).map(|id| self.service(id))
    }

    /// Services without a dependency, in declaration order.
    pub fn roots(&self) -> &[ServiceId] {
        &self.roots
    }

    /// Services without dependents, in declaration order.
    pub fn leaves(&self) -> Vec<ServiceId> {
        self.ids().filter(|&id| self.service(id).is_leaf()).collect()
    }

    /// Dependency-respecting linear order.
    pub fn order(&self) -> &[ServiceId] {
        &self.order
    }

    pub fn ids(&self) -> impl Iterator<Item = ServiceId> + '_ {
        (0..self.services.len()).map(ServiceId)
    }

    pub fn names(&self, ids: &[ServiceId]) -> Vec<&str> {
        ids.iter().map(|&id| self.service(id).name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn validate_names(specs: &[ServiceSpec]) -> Result<(), GraphError> {
    let mut service_names = HashSet::new();
    for spec in specs {
        if spec.name.is_empty() {
            return Err(GraphError::EmptyName("service"));
        }
        if !service_names.insert(spec.name.as_str()) {
            return Err(GraphError::DuplicateServiceName(spec.name.clone()));
        }

        let mut process_names = HashSet::new();
        for process in &spec.processes {
            if process.name.is_empty() {
                return Err(GraphError::EmptyName("process"));
            }
            if !process_names.insert(process.name.as_str()) {
                return Err(GraphError::DuplicateProcessName {
                    service: spec.name.clone(),
                    process: process.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// `adjacency[d]` lists the dependents of service `d` in declaration order.
fn build_adjacency(
    specs: &[ServiceSpec],
    index: &HashMap<String, ServiceId>,
) -> Result<Vec<Vec<usize>>, GraphError> {
    let mut adjacency = vec![Vec::new(); specs.len()];
    for (i, spec) in specs.iter().enumerate() {
        let Some(dependency) = spec.depends_on.as_deref().filter(|d| !d.is_empty()) else {
            continue;
        };
        let dep_id = index
            .get(dependency)
            .ok_or_else(|| GraphError::UnknownDependency {
                service: spec.name.clone(),
                dependency: dependency.to_string(),
            })?;
        adjacency[dep_id.0].push(i);
    }
    Ok(adjacency)
}

fn check_for_cycles(specs: &[ServiceSpec], adjacency: &[Vec<usize>]) -> Result<(), GraphError> {
    fn visit(
        node: usize,
        adjacency: &[Vec<usize>],
        visited: &mut [bool],
        path: &mut Vec<usize>,
        on_stack: &mut [bool],
    ) -> Option<Vec<usize>> {
        visited[node] = true;
        on_stack[node] = true;
        path.push(node);

        for &next in &adjacency[node] {
            if !visited[next] {
                if let Some(cycle) = visit(next, adjacency, visited, path, on_stack) {
                    return Some(cycle);
                }
            } else if on_stack[next] {
                let start = path.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
        }

        on_stack[node] = false;
        path.pop();
        None
    }

    let mut visited = vec![false; specs.len()];
    let mut on_stack = vec![false; specs.len()];
    let mut path = Vec::new();

    for node in 0..specs.len() {
        if visited[node] {
            continue;
        }
        if let Some(cycle) = visit(node, adjacency, &mut visited, &mut path, &mut on_stack) {
            // Edges run dependency -> dependent; report in depends_on direction.
            let names = cycle
                .into_iter()
                .rev()
                .map(|i| specs[i].name.clone())
                .collect();
            return Err(GraphError::CyclicDependency(names));
        }
    }
    Ok(())
}

fn topological_order(specs: &[ServiceSpec], adjacency: &[Vec<usize>]) -> Vec<ServiceId> {
    fn visit(node: usize, adjacency: &[Vec<usize>], visited: &mut [bool], order: &mut Vec<ServiceId>) {
        if visited[node] {
            return;
        }
        visited[node] = true;
        order.push(ServiceId(node));
        for &next in &adjacency[node] {
            visit(next, adjacency, visited, order);
        }
    }

    let mut visited = vec![false; specs.len()];
    let mut order = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        if spec.depends_on.as_deref().map_or(true, str::is_empty) {
            visit(i, adjacency, &mut visited, &mut order);
        }
    }
    debug_assert_eq!(order.len(), specs.len(), "acyclic forest must reach every service");
    order
}
