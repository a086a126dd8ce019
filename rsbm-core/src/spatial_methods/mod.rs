//! Discrete realisations of the continuous spatial operators
//!
//! A [`SpatialMethod`] turns gradient, divergence, integral, boundary value, broadcast and
//! spatial coordinates into matrices and vectors on a [`SubMesh`]. Discretisation picks the
//! method registered for the domain of each operator in a [`SpatialMethods`] table.
//!
//! Every method receives its operand already discretised, so the result is an expression
//! that can be evaluated directly against the state vector.

mod finite_volume;
mod zero_dimensional;

pub use finite_volume::FiniteVolume;
pub use zero_dimensional::ZeroDimensional;

use crate::boundary::BoundaryConditions;
use crate::domain::{Domain, DomainSet};
use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::SubMesh;
use crate::symbol::{Side, Symbol};
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// How the ends of a domain are treated by the gradient
#[derive(Debug, Clone, Copy)]
pub enum GradientBoundary<'a> {
    /// The domain wraps around
    Periodic,
    /// Discretised conditions at the two ends
    Conditions(&'a BoundaryConditions),
}

/// Discrete spatial operators on a one-dimensional submesh
pub trait SpatialMethod: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// The coordinate of every node
    fn spatial_variable(&self, domain: &DomainSet, submesh: &SubMesh) -> RSBMResult<Symbol>;

    /// Repeat a domain-free value on every node
    fn broadcast(&self, child: &Symbol, domain: &DomainSet, submesh: &SubMesh)
        -> RSBMResult<Symbol>;

    /// Gradient of a node-valued quantity, valued on the edges
    fn gradient(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        submesh: &SubMesh,
        boundary: GradientBoundary,
    ) -> RSBMResult<Symbol>;

    /// Divergence of an edge-valued quantity, valued on the nodes
    fn divergence(&self, child: &Symbol, domain: &DomainSet, submesh: &SubMesh)
        -> RSBMResult<Symbol>;

    /// Definite integral over the submesh
    fn integral(&self, child: &Symbol, submesh: &SubMesh) -> RSBMResult<Symbol>;

    /// Value at one end of the submesh
    ///
    /// Conditions registered for the operand are used where available.
    fn boundary_value(
        &self,
        child: &Symbol,
        side: Side,
        submesh: &SubMesh,
        conditions: Option<&BoundaryConditions>,
        on_edges: bool,
    ) -> RSBMResult<Symbol>;

    /// Interpolate a node-valued quantity onto the edges
    fn node_to_edge(&self, child: &Symbol, domain: &DomainSet, submesh: &SubMesh)
        -> RSBMResult<Symbol>;

    /// Block of the mass matrix for a differential variable on this submesh
    fn mass_matrix(&self, submesh: &SubMesh) -> DMatrix<f64> {
        DMatrix::identity(submesh.npts(), submesh.npts())
    }
}

/// The spatial method used for each domain
#[derive(Debug, Clone, Default)]
pub struct SpatialMethods(BTreeMap<Domain, Arc<dyn SpatialMethod>>);

impl SpatialMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, domain: Domain, method: Arc<dyn SpatialMethod>) -> Self {
        self.0.insert(domain, method);
        self
    }

    pub fn insert(&mut self, domain: Domain, method: Arc<dyn SpatialMethod>) {
        self.0.insert(domain, method);
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.0.contains_key(&domain)
    }

    /// The method for an expression on `domains`
    ///
    /// All domains must use the same kind of method.
    pub fn get(&self, domains: &DomainSet) -> RSBMResult<&Arc<dyn SpatialMethod>> {
        let mut found: Option<&Arc<dyn SpatialMethod>> = None;
        for domain in domains.iter() {
            let method = self
                .0
                .get(domain)
                .ok_or(RSBMError::MissingSpatialMethod { domain: *domain })?;
            match found {
                Some(previous) if previous.name() != method.name() => {
                    return Err(RSBMError::NotImplemented(format!(
                        "cannot combine the {} and {} methods across {}",
                        previous.name(),
                        method.name(),
                        domains
                    )))
                }
                Some(_) => {}
                None => found = Some(method),
            }
        }
        found.ok_or_else(|| RSBMError::InvalidDomain {
            symbol: "spatial operator".to_string(),
            reason: "no spatial method applies to a domain-free expression".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn lookup() {
        let methods = SpatialMethods::new()
            .with_method(Domain::NegativeElectrode, Arc::new(FiniteVolume))
            .with_method(Domain::Separator, Arc::new(FiniteVolume))
            .with_method(Domain::CurrentCollector, Arc::new(ZeroDimensional));

        let method = methods
            .get(&DomainSet::from([Domain::NegativeElectrode, Domain::Separator]))
            .unwrap();
        assert_eq!(method.name(), "finite volume");

        let err = methods
            .get(&Domain::PositiveElectrode.into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);

        let err = methods
            .get(&DomainSet::from([Domain::Separator, Domain::CurrentCollector]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }
}
