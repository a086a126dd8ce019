use super::state_layout::StateLayout;
use crate::boundary::{BoundaryCondition, BoundaryConditionType, BoundaryConditions};
use crate::domain::DomainSet;
use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::{Mesh, SubMesh};
use crate::model::Model;
use crate::spatial_methods::{GradientBoundary, SpatialMethod, SpatialMethods};
use crate::symbol::{Side, Symbol, SymbolId, SymbolKind};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A discretised node, and whether its values live on the mesh edges
#[derive(Debug, Clone)]
struct Discrete {
    symbol: Symbol,
    on_edges: bool,
}

impl Discrete {
    fn nodes(symbol: Symbol) -> Self {
        Self {
            symbol,
            on_edges: false,
        }
    }

    fn edges(symbol: Symbol) -> Self {
        Self {
            symbol,
            on_edges: true,
        }
    }
}

/// Rewrites continuous expressions into expressions over the state vector
///
/// One rewriter is used per discretisation run. Nodes shared between expressions are
/// rewritten once, so sharing in the source DAG carries over to the result.
pub(super) struct Rewriter<'a> {
    model: &'a Model,
    mesh: &'a Mesh,
    methods: &'a SpatialMethods,
    layout: &'a StateLayout,
    memo: HashMap<SymbolId, Discrete>,
    conditions: HashMap<SymbolId, Option<BoundaryConditions>>,
    /// Expressions whose gradient conditions are being discretised
    pending_conditions: HashSet<SymbolId>,
    /// Boundary values whose condition is being discretised
    pending: HashSet<(SymbolId, Side)>,
    /// Boundary values reached again while their Neumann condition was being discretised
    cycles: HashSet<(SymbolId, Side)>,
    submeshes: HashMap<DomainSet, SubMesh>,
}

impl<'a> Rewriter<'a> {
    pub(super) fn new(
        model: &'a Model,
        mesh: &'a Mesh,
        methods: &'a SpatialMethods,
        layout: &'a StateLayout,
    ) -> Self {
        Self {
            model,
            mesh,
            methods,
            layout,
            memo: HashMap::new(),
            conditions: HashMap::new(),
            pending_conditions: HashSet::new(),
            pending: HashSet::new(),
            cycles: HashSet::new(),
            submeshes: HashMap::new(),
        }
    }

    /// Discretise an expression valued on the nodes
    pub(super) fn process(&mut self, symbol: &Symbol) -> RSBMResult<Symbol> {
        let discrete = self.rewrite(symbol)?;
        if discrete.on_edges {
            return Err(RSBMError::Model(format!(
                "'{}' is valued on the mesh edges; take its divergence or boundary value first",
                symbol
            )));
        }
        Ok(discrete.symbol)
    }

    /// Discretise an output variable
    ///
    /// Outputs may be valued on the edges, e.g. fluxes.
    pub(super) fn process_output(&mut self, symbol: &Symbol) -> RSBMResult<Symbol> {
        Ok(self.rewrite(symbol)?.symbol)
    }

    /// Discretise an expression that must cover every node of `domain`
    ///
    /// Domain-free results are broadcast.
    pub(super) fn process_on(&mut self, symbol: &Symbol, domain: &DomainSet) -> RSBMResult<Symbol> {
        let discrete = self.process(symbol)?;
        if discrete.domain().is_empty() && !domain.is_empty() {
            let (method, submesh) = self.method_for(domain)?;
            return method.broadcast(&discrete, domain, &submesh);
        }
        Ok(discrete)
    }

    fn method_for(
        &mut self,
        domain: &DomainSet,
    ) -> RSBMResult<(&'a Arc<dyn SpatialMethod>, SubMesh)> {
        let methods: &'a SpatialMethods = self.methods;
        let method = methods.get(domain)?;
        let submesh = match self.submeshes.get(domain) {
            Some(submesh) => submesh.clone(),
            None => {
                let submesh = self.mesh.combine(domain)?;
                self.submeshes.insert(domain.clone(), submesh.clone());
                submesh
            }
        };
        Ok((method, submesh))
    }

    /// Discretised boundary conditions registered for `expression`
    fn conditions_for(&mut self, expression: &Symbol) -> RSBMResult<Option<BoundaryConditions>> {
        if let Some(found) = self.conditions.get(&expression.id()) {
            return Ok(found.clone());
        }
        if !self.pending_conditions.insert(expression.id()) {
            return Err(RSBMError::Model(format!(
                "the boundary conditions of '{}' depend on themselves",
                expression
            )));
        }
        let model: &'a Model = self.model;
        let discretised = match model.boundary_conditions_for(expression) {
            Some(conditions) => conditions.try_map(|value| self.process(value)).map(Some),
            None => Ok(None),
        };
        self.pending_conditions.remove(&expression.id());
        let discretised = discretised?;
        self.conditions.insert(expression.id(), discretised.clone());
        Ok(discretised)
    }

    /// The discretised condition used to evaluate `expression` on `side`
    ///
    /// Dirichlet values are used as they are, and so are Neumann values that can be
    /// discretised on their own. A Neumann value that reads this boundary value back, such as
    /// a surface flux driven by the surface concentration, is dropped and the method
    /// extrapolates from the nodes instead.
    fn boundary_value_condition(
        &mut self,
        expression: &Symbol,
        side: Side,
    ) -> RSBMResult<Option<BoundaryConditions>> {
        let model: &'a Model = self.model;
        let Some(condition) = model
            .boundary_conditions_for(expression)
            .and_then(|conditions| conditions.side(side))
        else {
            return Ok(None);
        };
        let key = (expression.id(), side);
        if !self.pending.insert(key) {
            if condition.kind == BoundaryConditionType::Neumann {
                self.cycles.insert(key);
            }
            return Err(RSBMError::Model(format!(
                "the {} boundary condition of '{}' depends on its own boundary value",
                side, expression
            )));
        }
        let value = self.process(&condition.value);
        self.pending.remove(&key);
        let cyclic = self.cycles.remove(&key);
        let value = match value {
            Ok(value) => value,
            Err(_) if cyclic => {
                debug!(
                    "Extrapolating the {} boundary value of '{}' without its Neumann condition",
                    side, expression
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let mut discretised = BoundaryConditions::default();
        let slot = match side {
            Side::Left => &mut discretised.left,
            Side::Right => &mut discretised.right,
        };
        *slot = Some(BoundaryCondition {
            value,
            kind: condition.kind,
        });
        Ok(Some(discretised))
    }

    fn shift_to_edges(&mut self, discrete: Discrete) -> RSBMResult<Discrete> {
        let domain = discrete.symbol.domain().clone();
        if discrete.on_edges || domain.is_empty() {
            return Ok(discrete);
        }
        let (method, submesh) = self.method_for(&domain)?;
        Ok(Discrete::edges(method.node_to_edge(
            &discrete.symbol,
            &domain,
            &submesh,
        )?))
    }

    fn rewrite(&mut self, symbol: &Symbol) -> RSBMResult<Discrete> {
        if let Some(found) = self.memo.get(&symbol.id()) {
            return Ok(found.clone());
        }
        let discrete = match symbol.kind() {
            SymbolKind::Scalar(_)
            | SymbolKind::Vector(_)
            | SymbolKind::Time
            | SymbolKind::StateVector { .. } => Discrete::nodes(symbol.clone()),
            SymbolKind::Parameter { .. } if symbol.domain().is_empty() => {
                Discrete::nodes(symbol.clone())
            }
            SymbolKind::Parameter { .. } => {
                // Values are bound as scalars, so repeat them over the nodes
                let (method, submesh) = self.method_for(symbol.domain())?;
                Discrete::nodes(method.broadcast(symbol, symbol.domain(), &submesh)?)
            }
            SymbolKind::Variable { name } => {
                let slice = self.layout.get(symbol).ok_or_else(|| {
                    RSBMError::Model(format!(
                        "variable '{}' is not governed by any equation",
                        name
                    ))
                })?;
                Discrete::nodes(Symbol::state_vector(
                    name.clone(),
                    slice.range.clone(),
                    symbol.domain().clone(),
                    symbol.family().cloned(),
                ))
            }
            SymbolKind::SpatialVariable { .. } => {
                let (method, submesh) = self.method_for(symbol.domain())?;
                Discrete::nodes(method.spatial_variable(symbol.domain(), &submesh)?)
            }
            SymbolKind::Unary { child, .. } => {
                let child = self.rewrite(child)?;
                Discrete {
                    symbol: symbol.with_children(vec![child.symbol]),
                    on_edges: child.on_edges,
                }
            }
            SymbolKind::Binary { left, right, .. } => {
                let mut left = self.rewrite(left)?;
                let mut right = self.rewrite(right)?;
                if left.on_edges && !right.on_edges {
                    right = self.shift_to_edges(right)?;
                } else if right.on_edges && !left.on_edges {
                    left = self.shift_to_edges(left)?;
                }
                Discrete {
                    on_edges: left.on_edges || right.on_edges,
                    symbol: symbol.with_children(vec![left.symbol, right.symbol]),
                }
            }
            SymbolKind::Gradient(child) => self.gradient(child)?,
            SymbolKind::Divergence(child) => {
                let flux = self.rewrite(child)?;
                if !flux.on_edges {
                    return Err(RSBMError::Model(format!(
                        "the divergence of '{}' needs an edge-valued operand such as a gradient",
                        child
                    )));
                }
                let (method, submesh) = self.method_for(symbol.domain())?;
                Discrete::nodes(method.divergence(&flux.symbol, symbol.domain(), &submesh)?)
            }
            SymbolKind::Integral(child) => {
                let integrand = self.rewrite(child)?;
                if integrand.on_edges {
                    return Err(RSBMError::NotImplemented(format!(
                        "integral of edge-valued '{}'",
                        child
                    )));
                }
                let (method, submesh) = self.method_for(child.domain())?;
                Discrete::nodes(method.integral(&integrand.symbol, &submesh)?)
            }
            SymbolKind::BoundaryValue { child, side } => {
                let operand = self.rewrite(child)?;
                let conditions = self.boundary_value_condition(child, *side)?;
                let (method, submesh) = self.method_for(child.domain())?;
                Discrete::nodes(method.boundary_value(
                    &operand.symbol,
                    *side,
                    &submesh,
                    conditions.as_ref(),
                    operand.on_edges,
                )?)
            }
            SymbolKind::Broadcast(child) => {
                let child = self.process(child)?;
                let (method, submesh) = self.method_for(symbol.domain())?;
                Discrete::nodes(method.broadcast(&child, symbol.domain(), &submesh)?)
            }
            SymbolKind::DomainConcatenation(children) => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    let part = self.rewrite(child)?;
                    if part.on_edges {
                        return Err(RSBMError::NotImplemented(format!(
                            "concatenation of edge-valued '{}'",
                            child
                        )));
                    }
                    parts.push(part.symbol);
                }
                let joined = match contiguous_state(&parts) {
                    Some(range) => Symbol::state_vector(
                        symbol.name(),
                        range,
                        symbol.domain().clone(),
                        symbol.family().cloned(),
                    ),
                    None => Symbol::numeric_concatenation(parts, symbol.domain().clone()),
                };
                Discrete::nodes(joined)
            }
            SymbolKind::NumericConcatenation(children) => {
                let children = children
                    .iter()
                    .map(|c| self.process(c))
                    .collect::<RSBMResult<Vec<_>>>()?;
                Discrete::nodes(symbol.with_children(children))
            }
            SymbolKind::MatrixMultiplication { child, .. } => {
                let child = self.process(child)?;
                Discrete::nodes(symbol.with_children(vec![child]))
            }
        };
        let discrete = Discrete {
            symbol: discrete.symbol.with_family(symbol.family()),
            on_edges: discrete.on_edges,
        };
        self.memo.insert(symbol.id(), discrete.clone());
        Ok(discrete)
    }

    fn gradient(&mut self, child: &Symbol) -> RSBMResult<Discrete> {
        let operand = self.rewrite(child)?;
        if operand.on_edges {
            return Err(RSBMError::NotImplemented(format!(
                "gradient of edge-valued '{}'",
                child
            )));
        }
        let domain = child.domain();
        let (method, submesh) = self.method_for(domain)?;
        if self.model.is_periodic(domain) {
            return Ok(Discrete::edges(method.gradient(
                &operand.symbol,
                domain,
                &submesh,
                GradientBoundary::Periodic,
            )?));
        }
        let conditions = self.conditions_for(child)?.ok_or_else(|| {
            RSBMError::Model(format!(
                "no boundary conditions for the gradient of '{}'",
                child
            ))
        })?;
        if let Some(side) = [Side::Left, Side::Right]
            .into_iter()
            .find(|side| conditions.side(*side).is_none())
        {
            return Err(RSBMError::Model(format!(
                "no {} boundary condition for the gradient of '{}'",
                side, child
            )));
        }
        Ok(Discrete::edges(method.gradient(
            &operand.symbol,
            domain,
            &submesh,
            GradientBoundary::Conditions(&conditions),
        )?))
    }
}

/// The joint range of state-vector slices that follow on from each other
fn contiguous_state(parts: &[Symbol]) -> Option<std::ops::Range<usize>> {
    let mut range: Option<std::ops::Range<usize>> = None;
    for part in parts {
        let SymbolKind::StateVector { slice, .. } = part.kind() else {
            return None;
        };
        range = match range {
            None => Some(slice.clone()),
            Some(r) if r.end == slice.start => Some(r.start..slice.end),
            Some(_) => return None,
        };
    }
    range
}
