//! Type definitions for the model module.

use crate::errors::{RSBMError, RSBMResult};
use crate::submodel::SubModel;
use crate::symbol::{Symbol, SymbolKind};
use petgraph::Graph;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type alias for a submodel wrapped in an Arc for shared ownership.
pub type S = Arc<dyn SubModel>;

/// Graph of dependencies between governed variables.
///
/// Nodes are variable names. An edge `v -> w` means the equation governing `w` reads `v`.
pub type DependencyGraph = Graph<String, ()>;

/// The kind of solver a model needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    /// Only differential equations: any ODE integrator will do
    Ode,
    /// At least one algebraic equation: a DAE solver is required
    Dae,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Ode => write!(f, "ODE"),
            SolverKind::Dae => write!(f, "DAE"),
        }
    }
}

/// Whether an equation is differential or algebraic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquationKind {
    Differential,
    Algebraic,
}

/// The variables governed by an equation keyed on `key`
///
/// Keys are either a single variable or a concatenation of variables on adjacent domains.
pub(crate) fn state_variables(key: &Symbol) -> RSBMResult<Vec<Symbol>> {
    match key.kind() {
        SymbolKind::Variable { .. } => Ok(vec![key.clone()]),
        SymbolKind::DomainConcatenation(children) if children.iter().all(Symbol::is_variable) => {
            Ok(children.clone())
        }
        _ => Err(RSBMError::Model(format!(
            "equations must be keyed on a variable or a concatenation of variables, found '{}'",
            key
        ))),
    }
}

/// A short name for a submodel, taken from its `Debug` representation.
pub(crate) fn submodel_name(submodel: &S) -> String {
    let name = format!("{:?}", submodel);
    name.split(['{', ' ', '('])
        .next()
        .unwrap_or("UnknownSubModel")
        .to_string()
}
