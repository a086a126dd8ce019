use crate::boundary::BoundaryConditions;
use crate::errors::RSBMResult;
use crate::symbol::Symbol;
use crate::variables::Variables;
use std::fmt::Debug;

/// A piece of physics contributing variables and equations to a model
///
/// Assembly calls the methods in a fixed order:
///
/// 1. [`get_fundamental_variables`](SubModel::get_fundamental_variables) on every submodel,
/// 2. [`get_coupled_variables`](SubModel::get_coupled_variables) until every submodel has
///    resolved its inputs,
/// 3. the `set_*` methods, which read the full set of resolved variables.
///
/// A submodel whose inputs are not available yet should propagate the
/// [`MissingVariable`](crate::errors::RSBMError::MissingVariable) error returned by
/// [`Variables::get`]; assembly retries it once more variables have been resolved.
///
/// Every method has an empty default, so a submodel only implements the stages it
/// contributes to. Each submodel only registers equations for the variables it owns.
#[typetag::serde(tag = "type")]
pub trait SubModel: Debug + Send + Sync {
    /// Variables that do not depend on any other submodel
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        Ok(Variables::new())
    }

    /// Variables built from the outputs of other submodels
    fn get_coupled_variables(&self, _variables: &Variables) -> RSBMResult<Variables> {
        Ok(Variables::new())
    }

    /// Differential equations `d(variable)/dt = expression`
    fn set_rhs(&self, _variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        Ok(vec![])
    }

    /// Algebraic equations `0 = expression`
    fn set_algebraic(&self, _variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        Ok(vec![])
    }

    fn set_boundary_conditions(
        &self,
        _variables: &Variables,
    ) -> RSBMResult<Vec<(Symbol, BoundaryConditions)>> {
        Ok(vec![])
    }

    fn set_initial_conditions(&self, _variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        Ok(vec![])
    }
}
