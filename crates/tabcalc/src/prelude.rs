//! Prelude module - common imports for tabcalc users
//!
//! ```rust
//! use tabcalc::prelude::*;
//! ```

pub use crate::{
    // Errors
    ApplyError,
    // Calculation types
    CalculationStats,
    // Cell types
    CellId,
    CellSnapshot,
    CellUpdate,
    CollaboratorError,
    DependencyGraph,
    EngineOptions,
    EvaluationContext,
    FormulaBindings,
    FormulaDefinition,
    // Main types
    FormulaEngine,
    FormulaError,
    FormulaExpr,
    // Collaborator traits
    FormulaLookup,
    FormulaValue,
    RawValue,
    RecalcError,
    ResultSink,
    RowContextProvider,
    TableSchema,
};
