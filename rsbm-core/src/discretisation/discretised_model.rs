use super::state_layout::StateLayout;
use crate::errors::{RSBMError, RSBMResult};
use crate::model::{EquationKind, SolverKind};
use crate::parameters::ParameterValues;
use crate::symbol::{Bindings, Symbol, Value};
use crate::variables::Variables;
use nalgebra::{DMatrix, DVector};
use std::ops::Range;

/// A model whose expressions can be evaluated directly from `(t, y)`
///
/// The system it describes is `M dy/dt = F(t, y)`, where the mass matrix `M` has identity
/// blocks on the rows of differential variables and zero rows for algebraic ones.
#[derive(Debug, Clone)]
pub struct DiscretisedModel {
    pub(super) name: String,
    pub(super) layout: StateLayout,
    pub(super) mass_matrix: DMatrix<f64>,
    pub(super) initial_state: DVector<f64>,
    pub(super) rhs: Symbol,
    pub(super) algebraic: Symbol,
    /// `rhs` stacked on `algebraic`, so shared subexpressions are evaluated once
    pub(super) equations: Symbol,
    pub(super) variables: Variables,
    pub(super) parameters: ParameterValues,
}

impl DiscretisedModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Length of the state vector
    pub fn n_states(&self) -> usize {
        self.layout.len()
    }

    pub fn initial_state(&self) -> &DVector<f64> {
        &self.initial_state
    }

    pub fn mass_matrix(&self) -> &DMatrix<f64> {
        &self.mass_matrix
    }

    /// Right-hand sides of all differential equations, in state order
    pub fn rhs(&self) -> &Symbol {
        &self.rhs
    }

    /// Residuals of all algebraic equations, in state order
    pub fn algebraic(&self) -> &Symbol {
        &self.algebraic
    }

    /// Discretised output variables
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn parameters(&self) -> &ParameterValues {
        &self.parameters
    }

    /// Add or replace parameter values used during evaluation
    pub fn with_parameter_values(mut self, values: ParameterValues) -> Self {
        self.parameters.update(&values);
        self
    }

    pub fn is_dae(&self) -> bool {
        self.layout
            .iter()
            .any(|s| s.kind == EquationKind::Algebraic)
    }

    pub fn solver_kind(&self) -> SolverKind {
        if self.is_dae() {
            SolverKind::Dae
        } else {
            SolverKind::Ode
        }
    }

    /// Range of the state vector holding the variable called `name`
    pub fn slice_of(&self, name: &str) -> RSBMResult<Range<usize>> {
        self.layout.range_by_name(name)
    }

    fn bindings<'a>(&'a self, t: f64, y: &'a DVector<f64>) -> RSBMResult<Bindings<'a>> {
        check_len("state vector", self.n_states(), y.len())?;
        Ok(Bindings::new()
            .at_time(t)
            .with_state(y)
            .with_parameters(&self.parameters))
    }

    /// `F(t, y)`: the right-hand sides followed by the algebraic residuals
    pub fn rhs_algebraic(&self, t: f64, y: &DVector<f64>) -> RSBMResult<DVector<f64>> {
        let value = self.equations.evaluate(&self.bindings(t, y)?)?.into_vector();
        check_len(&self.name, self.n_states(), value.len())?;
        Ok(value)
    }

    /// `M dy/dt - F(t, y)`, which vanishes on a solution
    pub fn residuals(
        &self,
        t: f64,
        y: &DVector<f64>,
        ydot: &DVector<f64>,
    ) -> RSBMResult<DVector<f64>> {
        check_len("time derivative", self.n_states(), ydot.len())?;
        let f = self.rhs_algebraic(t, y)?;
        Ok(&self.mass_matrix * ydot - f)
    }

    /// `dF/dy` at `(t, y)`
    pub fn jacobian(&self, t: f64, y: &DVector<f64>) -> RSBMResult<DMatrix<f64>> {
        let (value, jacobian) = self
            .equations
            .evaluate_with_jacobian(&self.bindings(t, y)?, self.n_states())?;
        check_len(&self.name, self.n_states(), value.len())?;
        Ok(jacobian)
    }

    /// Evaluate the output variable called `name`
    pub fn evaluate_variable(&self, name: &str, t: f64, y: &DVector<f64>) -> RSBMResult<Value> {
        let symbol = self.variables.get(name)?;
        symbol.evaluate(&self.bindings(t, y)?)
    }
}

fn check_len(what: &str, expected: usize, found: usize) -> RSBMResult<()> {
    if expected != found {
        return Err(RSBMError::ShapeMismatch {
            symbol: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
