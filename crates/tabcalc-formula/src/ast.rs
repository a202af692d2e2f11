//! Formula Abstract Syntax Tree types

use tabcalc_core::{CellId, ColumnId, RowId, TableId};

/// Formula expression AST
///
/// Every node owns its operand subtrees; cycles can only arise between
/// cells, never inside one tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Constant(f64),

    // === References ===
    /// Reference to a cell, usually a sibling in the current row
    CellRef(CellReference),

    // === Operators ===
    /// Arithmetic over an ordered operand list
    BinaryOp {
        op: BinaryOperator,
        operands: Vec<FormulaExpr>,
    },

    /// Aggregate over an ordered operand list
    Aggregate {
        func: AggregateFunction,
        operands: Vec<FormulaExpr>,
    },

    /// Two-way branch; only the selected branch is evaluated
    Conditional {
        condition: Box<FormulaExpr>,
        then_branch: Box<FormulaExpr>,
        else_branch: Box<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Numeric literal
    pub fn constant(value: f64) -> Self {
        FormulaExpr::Constant(value)
    }

    /// Reference to a column in the current row
    pub fn column(column: impl Into<ColumnId>) -> Self {
        FormulaExpr::CellRef(CellReference::current(column))
    }

    /// Arithmetic node
    pub fn binary(op: BinaryOperator, operands: Vec<FormulaExpr>) -> Self {
        FormulaExpr::BinaryOp { op, operands }
    }

    /// Aggregate node
    pub fn aggregate(func: AggregateFunction, operands: Vec<FormulaExpr>) -> Self {
        FormulaExpr::Aggregate { func, operands }
    }

    /// Conditional node
    pub fn conditional(
        condition: FormulaExpr,
        then_branch: FormulaExpr,
        else_branch: FormulaExpr,
    ) -> Self {
        FormulaExpr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Cells this expression reads when hosted in `table`/`row`
    ///
    /// Both branches of a conditional are included. Duplicates are removed;
    /// order follows first appearance.
    pub fn references(&self, table: &str, row: &str) -> Vec<CellId> {
        let mut refs = Vec::new();
        self.collect_references(table, row, &mut refs);
        refs
    }

    fn collect_references(&self, table: &str, row: &str, refs: &mut Vec<CellId>) {
        match self {
            FormulaExpr::Constant(_) => {}
            FormulaExpr::CellRef(cell_ref) => {
                let id = cell_ref.resolve(table, row);
                if !refs.contains(&id) {
                    refs.push(id);
                }
            }
            FormulaExpr::BinaryOp { operands, .. } | FormulaExpr::Aggregate { operands, .. } => {
                for operand in operands {
                    operand.collect_references(table, row, refs);
                }
            }
            FormulaExpr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_references(table, row, refs);
                then_branch.collect_references(table, row, refs);
                else_branch.collect_references(table, row, refs);
            }
        }
    }

    /// Depth of the expression tree (a leaf is 1)
    pub fn depth(&self) -> usize {
        match self {
            FormulaExpr::Constant(_) | FormulaExpr::CellRef(_) => 1,
            FormulaExpr::BinaryOp { operands, .. } | FormulaExpr::Aggregate { operands, .. } => {
                1 + operands.iter().map(FormulaExpr::depth).max().unwrap_or(0)
            }
            FormulaExpr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => 1 + condition.depth().max(then_branch.depth()).max(else_branch.depth()),
        }
    }
}

/// Table or row part of a reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    /// Resolved against the evaluation context
    #[default]
    Current,
    /// Explicit identifier
    Id(String),
}

impl Scope {
    /// Resolve against the id of the current table or row
    pub fn resolve<'a>(&'a self, current: &'a str) -> &'a str {
        match self {
            Scope::Current => current,
            Scope::Id(id) => id,
        }
    }
}

/// Cell reference with optional table and row
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub table: Scope,
    pub row: Scope,
    pub column: ColumnId,
}

impl CellReference {
    /// Reference to a column of the current row of the current table
    pub fn current(column: impl Into<ColumnId>) -> Self {
        Self {
            table: Scope::Current,
            row: Scope::Current,
            column: column.into(),
        }
    }

    /// Resolve to a concrete cell id for a host row
    pub fn resolve(&self, table: &str, row: &str) -> CellId {
        CellId::new(
            TableId::from(self.table.resolve(table)),
            RowId::from(self.row.resolve(row)),
            self.column.clone(),
        )
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Document tag of the operator
    pub fn tag(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "subtract",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
        }
    }
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Average,
    Count,
}

impl AggregateFunction {
    /// Document tag of the function
    pub fn tag(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Average => "average",
            AggregateFunction::Count => "count",
        }
    }
}
