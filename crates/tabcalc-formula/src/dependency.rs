//! Dependency tracking for formula calculation

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;
use std::collections::{btree_set, BTreeSet, VecDeque};
use tabcalc_core::CellId;

/// Edges of one cell, in both directions
#[derive(Debug, Default, Clone)]
struct Node {
    /// Cells this cell reads
    dependencies: BTreeSet<CellId>,
    /// Cells that read this cell
    dependents: BTreeSet<CellId>,
}

impl Node {
    fn is_isolated(&self) -> bool {
        self.dependencies.is_empty() && self.dependents.is_empty()
    }
}

/// Per-cell state while computing a calculation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    /// On the DFS stack
    Visiting,
    /// Emitted
    Visited,
}

/// Dependency graph for formula cells
///
/// Tracks which cells read which other cells, enabling ordered
/// recalculation. Both directions are indexed and only ever updated
/// together, so `b ∈ dependencies(a)` exactly when `a ∈ dependents(b)`.
///
/// Mutation takes `&mut self`; hosts sharing one graph between tasks wrap it
/// in a lock so writers are serialized and readers never overlap a write.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: AHashMap<CellId, Node>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: `cell` reads `depends_on`
    ///
    /// Idempotent. Nodes are created for both cells if absent.
    pub fn add_dependency(&mut self, cell: CellId, depends_on: CellId) {
        self.nodes
            .entry(depends_on.clone())
            .or_default()
            .dependents
            .insert(cell.clone());
        self.nodes
            .entry(cell)
            .or_default()
            .dependencies
            .insert(depends_on);
    }

    /// Replace everything `cell` reads with `depends_on`
    ///
    /// Cells that read `cell` are kept.
    pub fn set_dependencies(&mut self, cell: CellId, depends_on: impl IntoIterator<Item = CellId>) {
        self.clear_dependencies(&cell);
        self.nodes.entry(cell.clone()).or_default();
        for dep in depends_on {
            self.add_dependency(cell.clone(), dep);
        }
    }

    /// Register the references of a formula hosted in `target`
    pub fn track_formula(&mut self, target: &CellId, expr: &FormulaExpr) {
        let refs = expr.references(&target.table, &target.row);
        self.set_dependencies(target.clone(), refs);
    }

    /// Remove every edge from `cell` to the cells it reads
    pub fn clear_dependencies(&mut self, cell: &CellId) {
        let precedents = match self.nodes.get_mut(cell) {
            Some(node) => std::mem::take(&mut node.dependencies),
            None => return,
        };

        for precedent in precedents {
            if let Some(node) = self.nodes.get_mut(&precedent) {
                node.dependents.remove(cell);
                if node.is_isolated() {
                    self.nodes.remove(&precedent);
                }
            }
        }
    }

    /// Remove a cell and every edge touching it
    pub fn remove_cell(&mut self, cell: &CellId) {
        let node = match self.nodes.remove(cell) {
            Some(node) => node,
            None => return,
        };

        // Remove from all precedents' dependents list
        for precedent in node.dependencies {
            if let Some(other) = self.nodes.get_mut(&precedent) {
                other.dependents.remove(cell);
            }
        }

        // Remove as a precedent for others
        for dependent in node.dependents {
            if let Some(other) = self.nodes.get_mut(&dependent) {
                other.dependencies.remove(cell);
            }
        }
    }

    /// Get cells that read the given cell
    pub fn dependents(&self, cell: &CellId) -> impl Iterator<Item = &CellId> + '_ {
        self.nodes
            .get(cell)
            .into_iter()
            .flat_map(|node| node.dependents.iter())
    }

    /// Get cells that the given cell reads
    pub fn dependencies(&self, cell: &CellId) -> impl Iterator<Item = &CellId> + '_ {
        self.nodes
            .get(cell)
            .into_iter()
            .flat_map(|node| node.dependencies.iter())
    }

    /// All cells transitively affected when `changed` changes
    ///
    /// Breadth-first over the dependents relation, in discovery order. Each
    /// cell appears once and `changed` itself is never included, even when
    /// a cycle leads back to it.
    pub fn affected_cells(&self, changed: &CellId) -> Vec<CellId> {
        let mut affected = Vec::new();
        let mut seen: BTreeSet<&CellId> = BTreeSet::new();
        let mut queue: VecDeque<&CellId> = VecDeque::new();

        seen.insert(changed);
        queue.push_back(changed);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents(current) {
                if seen.insert(dependent) {
                    affected.push(dependent.clone());
                    queue.push_back(dependent);
                }
            }
        }

        affected
    }

    /// Order in which `cells` and everything they read must be computed
    ///
    /// Depth-first post-order over the dependencies relation: every cell
    /// appears once, after all the cells it reads. A cell reached again
    /// while it is still on the stack aborts the whole request with
    /// [`FormulaError::CircularDependency`].
    pub fn calculation_order(&self, cells: &[CellId]) -> FormulaResult<Vec<CellId>> {
        let mut result = Vec::new();
        let mut state: AHashMap<&CellId, VisitState> = AHashMap::new();

        for cell in cells {
            self.topological_sort(cell, &mut result, &mut state)?;
        }

        Ok(result)
    }

    /// Topological sort helper (iterative DFS)
    ///
    /// Each stack frame holds a cell and the remaining cells it reads, so
    /// chain length is bounded by heap rather than thread stack.
    fn topological_sort<'a>(
        &'a self,
        root: &'a CellId,
        result: &mut Vec<CellId>,
        state: &mut AHashMap<&'a CellId, VisitState>,
    ) -> FormulaResult<()> {
        match state.get(root) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                return Err(FormulaError::CircularDependency(root.clone()));
            }
            None => {}
        }

        state.insert(root, VisitState::Visiting);
        let mut stack: Vec<(&'a CellId, Option<btree_set::Iter<'a, CellId>>)> =
            vec![(root, self.dependency_iter(root))];

        while let Some((cell, dependencies)) = stack.last_mut() {
            match dependencies.as_mut().and_then(Iterator::next) {
                // Visit everything this cell reads first
                Some(dependency) => match state.get(dependency) {
                    Some(VisitState::Visited) => {}
                    Some(VisitState::Visiting) => {
                        return Err(FormulaError::CircularDependency(dependency.clone()));
                    }
                    None => {
                        state.insert(dependency, VisitState::Visiting);
                        stack.push((dependency, self.dependency_iter(dependency)));
                    }
                },
                None => {
                    let cell = *cell;
                    stack.pop();
                    state.insert(cell, VisitState::Visited);
                    result.push(cell.clone());
                }
            }
        }

        Ok(())
    }

    fn dependency_iter(&self, cell: &CellId) -> Option<btree_set::Iter<'_, CellId>> {
        self.nodes.get(cell).map(|node| node.dependencies.iter())
    }

    /// Detect circular references involving a cell
    pub fn has_circular_reference(&self, cell: &CellId) -> bool {
        matches!(
            self.calculation_order(std::slice::from_ref(cell)),
            Err(FormulaError::CircularDependency(_))
        )
    }

    /// Whether the graph has a node for this cell
    pub fn contains(&self, cell: &CellId) -> bool {
        self.nodes.contains_key(cell)
    }

    /// Number of cells in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no cells
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of "reads" edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.dependencies.len()).sum()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
