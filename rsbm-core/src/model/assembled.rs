use crate::boundary::BoundaryConditions;
use crate::domain::{Domain, DomainSet};
use crate::errors::{RSBMError, RSBMResult};
use crate::symbol::Symbol;
use crate::variables::Variables;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap};

use super::types::{state_variables, DependencyGraph, SolverKind};
use super::validation;

/// A frozen set of equations
///
/// Created by [`ModelBuilder::build`](super::ModelBuilder::build) and not modifiable
/// afterwards. Equations are kept in registration order, which fixes the layout of the
/// state vector after discretisation.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) name: String,
    pub(crate) rhs: Vec<(Symbol, Symbol)>,
    pub(crate) algebraic: Vec<(Symbol, Symbol)>,
    pub(crate) initial_conditions: Vec<(Symbol, Symbol)>,
    pub(crate) boundary_conditions: Vec<(Symbol, BoundaryConditions)>,
    pub(crate) variables: Variables,
    pub(crate) periodic_domains: BTreeSet<Domain>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Differential equations `d(key)/dt = expression`
    pub fn rhs(&self) -> &[(Symbol, Symbol)] {
        &self.rhs
    }

    /// Algebraic equations `0 = expression`, keyed on the variable they determine
    pub fn algebraic(&self) -> &[(Symbol, Symbol)] {
        &self.algebraic
    }

    pub fn initial_conditions(&self) -> &[(Symbol, Symbol)] {
        &self.initial_conditions
    }

    pub fn boundary_conditions(&self) -> &[(Symbol, BoundaryConditions)] {
        &self.boundary_conditions
    }

    /// Output variables
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn periodic_domains(&self) -> &BTreeSet<Domain> {
        &self.periodic_domains
    }

    /// Whether every domain of `domain` is periodic
    pub fn is_periodic(&self, domain: &DomainSet) -> bool {
        !domain.is_empty() && domain.iter().all(|d| self.periodic_domains.contains(d))
    }

    pub fn initial_condition(&self, key: &Symbol) -> Option<&Symbol> {
        self.initial_conditions
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn boundary_conditions_for(&self, expression: &Symbol) -> Option<&BoundaryConditions> {
        self.boundary_conditions
            .iter()
            .find(|(k, _)| k == expression)
            .map(|(_, v)| v)
    }

    /// All equations, differential first
    pub fn equations(&self) -> impl Iterator<Item = &(Symbol, Symbol)> {
        self.rhs.iter().chain(self.algebraic.iter())
    }

    /// Look up an output variable by name
    pub fn get_variable(&self, name: &str) -> RSBMResult<&Symbol> {
        self.variables.get(name)
    }

    /// Check that the model is well posed
    ///
    /// See [`validation`](super::validation) for the clauses that are checked.
    pub fn check_well_posedness(&self) -> RSBMResult<()> {
        validation::check_well_posedness(self)
    }

    /// The solver needed to integrate this model
    pub fn default_solver(&self) -> SolverKind {
        if self.algebraic.is_empty() {
            SolverKind::Ode
        } else {
            SolverKind::Dae
        }
    }

    /// Build the graph of dependencies between governed variables.
    pub fn dependency_graph(&self) -> RSBMResult<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let mut nodes: HashMap<Symbol, NodeIndex> = HashMap::new();
        let mut keys = vec![];
        for (key, _) in self.equations() {
            let node = graph.add_node(key.name());
            for variable in state_variables(key)? {
                nodes.insert(variable, node);
            }
            keys.push(node);
        }
        for ((_, expression), target) in self.equations().zip(keys) {
            for variable in expression.variables() {
                if let Some(source) = nodes.get(&variable) {
                    graph.update_edge(*source, target, ());
                }
            }
        }
        Ok(graph)
    }

    /// Create a diagram of the dependencies between governed variables.
    ///
    /// Useful for debugging.
    pub fn as_dot(&self) -> RSBMResult<String> {
        let graph = self.dependency_graph()?;
        Ok(format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[Config::NodeNoLabel, Config::EdgeNoLabel],
                &|_, _| String::new(),
                &|_, (_, name)| {
                    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                    format!("label = \"{}\"", escaped)
                },
            )
        ))
    }

    /// Rewrite every expression of the model with `f`
    ///
    /// Equation keys are passed through `f` as well, so a rewrite that leaves variables
    /// untouched keeps the keys of the model.
    pub(crate) fn map_expressions(
        &self,
        f: &mut dyn FnMut(&Symbol) -> RSBMResult<Symbol>,
    ) -> RSBMResult<Model> {
        let mut pairs = |items: &[(Symbol, Symbol)]| -> RSBMResult<Vec<(Symbol, Symbol)>> {
            items
                .iter()
                .map(|(k, v)| Ok((f(k)?, f(v)?)))
                .collect()
        };
        let rhs = pairs(&self.rhs)?;
        let algebraic = pairs(&self.algebraic)?;
        let initial_conditions = pairs(&self.initial_conditions)?;

        let mut boundary_conditions = Vec::with_capacity(self.boundary_conditions.len());
        for (key, bcs) in &self.boundary_conditions {
            boundary_conditions.push((f(key)?, bcs.try_map(&mut *f)?));
        }
        let mut variables = Variables::new();
        for (name, symbol) in &self.variables {
            variables.insert(name.clone(), f(symbol)?);
        }
        for (key, _) in rhs.iter().chain(&algebraic) {
            if state_variables(key).is_err() {
                return Err(RSBMError::Model(format!(
                    "rewriting model '{}' changed equation key '{}'",
                    self.name, key
                )));
            }
        }
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
