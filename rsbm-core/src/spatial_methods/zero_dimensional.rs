use crate::boundary::BoundaryConditions;
use crate::domain::DomainSet;
use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::SubMesh;
use crate::symbol::{Side, Symbol};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::{GradientBoundary, SpatialMethod};

/// Method for lumped domains with a single node
///
/// Integrals and boundary values are the value itself. Derivatives have no meaning.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ZeroDimensional;

impl ZeroDimensional {
    fn no_derivatives(&self, operator: &str) -> RSBMError {
        RSBMError::NotImplemented(format!(
            "the {} of a zero-dimensional quantity is undefined",
            operator
        ))
    }
}

impl SpatialMethod for ZeroDimensional {
    fn name(&self) -> &'static str {
        "zero dimensional"
    }

    fn spatial_variable(&self, domain: &DomainSet, submesh: &SubMesh) -> RSBMResult<Symbol> {
        Ok(Symbol::vector(
            DVector::from_element(1, submesh.nodes[0]),
            domain.clone(),
        ))
    }

    fn broadcast(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        _submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        Symbol::vector(DVector::from_element(1, 1.0), domain.clone()).mul(child)
    }

    fn gradient(
        &self,
        _child: &Symbol,
        _domain: &DomainSet,
        _submesh: &SubMesh,
        _boundary: GradientBoundary,
    ) -> RSBMResult<Symbol> {
        Err(self.no_derivatives("gradient"))
    }

    fn divergence(
        &self,
        _child: &Symbol,
        _domain: &DomainSet,
        _submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        Err(self.no_derivatives("divergence"))
    }

    fn integral(&self, child: &Symbol, _submesh: &SubMesh) -> RSBMResult<Symbol> {
        Ok(child.clone())
    }

    fn boundary_value(
        &self,
        child: &Symbol,
        _side: Side,
        _submesh: &SubMesh,
        _conditions: Option<&BoundaryConditions>,
        _on_edges: bool,
    ) -> RSBMResult<Symbol> {
        Ok(child.clone())
    }

    fn node_to_edge(
        &self,
        child: &Symbol,
        _domain: &DomainSet,
        _submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        Ok(child.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::errors::ErrorKind;
    use crate::symbol::{Bindings, Value};

    #[test]
    fn lumped_operators() {
        let submesh = SubMesh::point();
        let domain = DomainSet::from(Domain::CurrentCollector);
        let u = Symbol::state_vector("u", 0..1, domain.clone(), None);
        let y = DVector::from_element(1, 2.5);
        let bindings = Bindings::new().with_state(&y);

        let integral = ZeroDimensional.integral(&u, &submesh).unwrap();
        assert_eq!(integral.evaluate(&bindings).unwrap().as_scalar(), Some(2.5));

        let broadcast = ZeroDimensional
            .broadcast(&Symbol::scalar(4.0), &domain, &submesh)
            .unwrap();
        assert_eq!(
            broadcast.evaluate(&bindings).unwrap(),
            Value::Vector(DVector::from_element(1, 4.0))
        );

        let err = ZeroDimensional
            .divergence(&u, &domain, &submesh)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }
}
