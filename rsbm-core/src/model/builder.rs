//! Model builder for assembling models from submodels.

use crate::boundary::BoundaryConditions;
use crate::domain::Domain;
use crate::errors::{RSBMError, RSBMResult};
use crate::symbol::Symbol;
use crate::variables::Variables;
use log::{debug, info, warn};
use std::collections::BTreeSet;

use super::assembled::Model;
use super::types::{state_variables, submodel_name, S};

/// Build a new model from a set of submodels and directly registered equations.
///
/// Submodels are resolved in three stages. First every submodel publishes its fundamental
/// variables. Then the coupled variables are resolved: a submodel whose inputs are not
/// published yet reports a missing variable and is retried on the next pass, until every
/// submodel has been resolved. Finally the equations are collected from every submodel.
///
/// The builder is the only mutable stage. [`ModelBuilder::build`] produces a frozen [`Model`].
pub struct ModelBuilder {
    name: String,
    submodels: Vec<S>,
    rhs: Vec<(Symbol, Symbol)>,
    algebraic: Vec<(Symbol, Symbol)>,
    initial_conditions: Vec<(Symbol, Symbol)>,
    boundary_conditions: Vec<(Symbol, BoundaryConditions)>,
    variables: Variables,
    periodic_domains: BTreeSet<Domain>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            name: "Unnamed model".to_string(),
            submodels: vec![],
            rhs: vec![],
            algebraic: vec![],
            initial_conditions: vec![],
            boundary_conditions: vec![],
            variables: Variables::new(),
            periodic_domains: BTreeSet::new(),
        }
    }

    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Register a submodel
    ///
    /// Submodels are resolved in the order they are registered.
    pub fn with_submodel(&mut self, submodel: S) -> &mut Self {
        self.submodels.push(submodel);
        self
    }

    /// Add a differential equation `d(variable)/dt = expression`
    pub fn with_rhs(&mut self, variable: &Symbol, expression: &Symbol) -> &mut Self {
        self.rhs.push((variable.clone(), expression.clone()));
        self
    }

    /// Add an algebraic equation `0 = expression` determining `variable`
    pub fn with_algebraic(&mut self, variable: &Symbol, expression: &Symbol) -> &mut Self {
        self.algebraic.push((variable.clone(), expression.clone()));
        self
    }

    pub fn with_initial_condition(
        &mut self,
        variable: &Symbol,
        value: impl Into<Symbol>,
    ) -> &mut Self {
        self.initial_conditions
            .push((variable.clone(), value.into()));
        self
    }

    pub fn with_boundary_conditions(
        &mut self,
        expression: &Symbol,
        conditions: BoundaryConditions,
    ) -> &mut Self {
        self.boundary_conditions
            .push((expression.clone(), conditions));
        self
    }

    /// Add an output variable
    pub fn with_variable(&mut self, name: impl Into<String>, symbol: &Symbol) -> &mut Self {
        self.variables.insert(name, symbol.clone());
        self
    }

    /// Mark a domain as periodic
    ///
    /// Gradients on periodic domains wrap around and need no boundary conditions.
    pub fn with_periodic_domain(&mut self, domain: Domain) -> &mut Self {
        self.periodic_domains.insert(domain);
        self
    }

    /// Publish the fundamental variables of every submodel
    fn fundamental_variables(&self, variables: &mut Variables) -> RSBMResult<()> {
        for submodel in &self.submodels {
            let name = submodel_name(submodel);
            for (variable, symbol) in submodel.get_fundamental_variables()? {
                if variables.contains(&variable) {
                    return Err(RSBMError::Model(format!(
                        "variable '{}' from {} is already defined by another submodel",
                        variable, name
                    )));
                }
                variables.insert(variable, symbol);
            }
        }
        Ok(())
    }

    /// Resolve coupled variables until every submodel has been resolved once
    fn coupled_variables(&self, variables: &mut Variables) -> RSBMResult<()> {
        let mut unresolved: Vec<&S> = self.submodels.iter().collect();
        let mut pass = 0;
        while !unresolved.is_empty() {
            pass += 1;
            let mut deferred = vec![];
            let mut last_missing = None;
            for submodel in unresolved.iter().copied() {
                match submodel.get_coupled_variables(variables) {
                    Ok(coupled) => {
                        for skipped in variables.extend_new(coupled) {
                            warn!(
                                "{} recomputed coupled variable '{}', keeping the existing definition",
                                submodel_name(submodel),
                                skipped
                            );
                        }
                    }
                    Err(RSBMError::MissingVariable { name }) => {
                        debug!(
                            "Deferring {} on pass {}: '{}' is not available yet",
                            submodel_name(submodel),
                            pass,
                            name
                        );
                        last_missing = Some((submodel, name));
                        deferred.push(submodel);
                    }
                    Err(e) => return Err(e),
                }
            }
            if deferred.len() == unresolved.len() {
                let (submodel, missing) = last_missing
                    .map(|(s, name)| (submodel_name(s), name))
                    .unwrap_or_default();
                return Err(RSBMError::Model(format!(
                    "could not resolve coupled variables: {} needs '{}', which no submodel provides",
                    submodel, missing
                )));
            }
            unresolved = deferred;
        }
        Ok(())
    }

    /// Build the model
    ///
    /// The result is not checked for well-posedness; see [`Model::check_well_posedness`].
    pub fn build(&self) -> RSBMResult<Model> {
        let mut variables = self.variables.clone();
        self.fundamental_variables(&mut variables)?;
        self.coupled_variables(&mut variables)?;

        let mut rhs = self.rhs.clone();
        let mut algebraic = self.algebraic.clone();
        let mut initial_conditions = self.initial_conditions.clone();
        let mut boundary_conditions: Vec<(Symbol, BoundaryConditions)> = vec![];

        for submodel in &self.submodels {
            rhs.extend(submodel.set_rhs(&variables)?);
        }
        for submodel in &self.submodels {
            algebraic.extend(submodel.set_algebraic(&variables)?);
        }
        let mut incoming = self.boundary_conditions.clone();
        for submodel in &self.submodels {
            incoming.extend(submodel.set_boundary_conditions(&variables)?);
        }
        for (expression, conditions) in incoming {
            match boundary_conditions.iter_mut().find(|(k, _)| k == &expression) {
                Some((_, existing)) => existing.merge(conditions, &expression)?,
                None => boundary_conditions.push((expression, conditions)),
            }
        }
        for submodel in &self.submodels {
            initial_conditions.extend(submodel.set_initial_conditions(&variables)?);
        }

        for (key, _) in rhs.iter().chain(&algebraic) {
            state_variables(key)?;
        }

        info!(
            "Assembled model '{}' from {} submodels: {} differential and {} algebraic equations, {} variables",
            self.name,
            self.submodels.len(),
            rhs.len(),
            algebraic.len(),
            variables.len()
        );

        Ok(Model {
            name: self.name.clone(),
            rhs,
            algebraic,
            initial_conditions,
            boundary_conditions,
            variables,
            periodic_domains: self.periodic_domains.clone(),
        })
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
