use crate::boundary::{BoundaryConditionType, BoundaryConditions};
use crate::domain::{CoordinateSystem, DomainSet};
use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::SubMesh;
use crate::symbol::{Side, Symbol};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::{GradientBoundary, SpatialMethod};

/// Cell-centred finite volumes
///
/// Unknowns live on the nodes (cell centres) and fluxes on the edges. A submesh with `n`
/// nodes has `n + 1` edges, so the gradient maps `n` values to `n + 1` and the divergence
/// maps them back.
///
/// Boundary conditions enter the gradient at the two outer edges:
///
/// * Dirichlet conditions use a ghost node mirrored through the boundary edge, which gives
///   the one-sided difference `(u_0 - g) / (x_0 - e_0)`,
/// * Neumann conditions prescribe the boundary flux directly,
/// * on periodic domains the outer edges share the difference across the wrap.
///
/// In spherical coordinates the divergence and integral are weighted by the shell volumes
/// `(r_{i+1}^3 - r_i^3) / 3`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FiniteVolume;

/// Volume of each cell, without the `4 pi` factor in spherical coordinates
fn cell_volumes(submesh: &SubMesh) -> DVector<f64> {
    let e = &submesh.edges;
    DVector::from_fn(submesh.npts(), |i, _| match submesh.coord_sys {
        CoordinateSystem::Cartesian => e[i + 1] - e[i],
        CoordinateSystem::Spherical => (e[i + 1].powi(3) - e[i].powi(3)) / 3.0,
    })
}

/// Add `coefficients * value` to `expression`, skipping zero values
fn with_boundary_term(
    expression: Symbol,
    coefficients: DVector<f64>,
    value: &Symbol,
    domain: &DomainSet,
) -> RSBMResult<Symbol> {
    if value.is_scalar_constant(0.0) {
        return Ok(expression);
    }
    let term = Symbol::vector(coefficients, domain.clone()).mul(value)?;
    expression.add(&term)
}

/// Finite differences across a cell of zero width are undefined
fn check_cell_widths(child: &Symbol, domain: &DomainSet, submesh: &SubMesh) -> RSBMResult<()> {
    let e = &submesh.edges;
    if e.len() < 2 || (1..e.len()).any(|i| e[i] <= e[i - 1]) {
        return Err(RSBMError::InvalidDomain {
            symbol: child.name(),
            reason: format!(
                "finite volumes need cells of positive width, but the submesh of {} has none",
                domain
            ),
        });
    }
    Ok(())
}

fn unit_row(len: usize, index: usize) -> DMatrix<f64> {
    let mut row = DMatrix::zeros(1, len);
    row[(0, index)] = 1.0;
    row
}

impl SpatialMethod for FiniteVolume {
    fn name(&self) -> &'static str {
        "finite volume"
    }

    fn spatial_variable(&self, domain: &DomainSet, submesh: &SubMesh) -> RSBMResult<Symbol> {
        let nodes = DVector::from_iterator(submesh.npts(), submesh.nodes.iter().copied());
        Ok(Symbol::vector(nodes, domain.clone()))
    }

    fn broadcast(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        Symbol::vector(DVector::from_element(submesh.npts(), 1.0), domain.clone()).mul(child)
    }

    fn gradient(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        submesh: &SubMesh,
        boundary: GradientBoundary,
    ) -> RSBMResult<Symbol> {
        check_cell_widths(child, domain, submesh)?;
        let n = submesh.npts();
        let x = &submesh.nodes;
        let e = &submesh.edges;
        let mut matrix = DMatrix::zeros(n + 1, n);
        for i in 1..n {
            let h = x[i] - x[i - 1];
            matrix[(i, i - 1)] = -1.0 / h;
            matrix[(i, i)] = 1.0 / h;
        }

        let conditions = match boundary {
            GradientBoundary::Periodic => {
                let h = (x[0] - e[0]) + (e[n] - x[n - 1]);
                for row in [0, n] {
                    matrix[(row, n - 1)] -= 1.0 / h;
                    matrix[(row, 0)] += 1.0 / h;
                }
                return Ok(Symbol::matrix_multiplication(matrix, child, domain.clone()));
            }
            GradientBoundary::Conditions(conditions) => conditions,
        };

        let mut terms = vec![];
        for side in [Side::Left, Side::Right] {
            let bc = conditions.side(side).ok_or_else(|| {
                RSBMError::Model(format!(
                    "no {} boundary condition for the gradient of '{}'",
                    side, child
                ))
            })?;
            let (row, column, h, sign) = match side {
                Side::Left => (0, 0, x[0] - e[0], 1.0),
                Side::Right => (n, n - 1, e[n] - x[n - 1], -1.0),
            };
            let mut coefficients = DVector::zeros(n + 1);
            match bc.kind {
                BoundaryConditionType::Dirichlet => {
                    // Ghost node at 2 e - x with value 2 g - u
                    matrix[(row, column)] = sign / h;
                    coefficients[row] = -sign / h;
                }
                BoundaryConditionType::Neumann => {
                    coefficients[row] = 1.0;
                }
            }
            terms.push((coefficients, bc.value.clone()));
        }

        let mut result = Symbol::matrix_multiplication(matrix, child, domain.clone());
        for (coefficients, value) in terms {
            result = with_boundary_term(result, coefficients, &value, domain)?;
        }
        Ok(result)
    }

    fn divergence(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        check_cell_widths(child, domain, submesh)?;
        let n = submesh.npts();
        let e = &submesh.edges;
        let volumes = cell_volumes(submesh);
        let area = |r: f64| match submesh.coord_sys {
            CoordinateSystem::Cartesian => 1.0,
            CoordinateSystem::Spherical => r * r,
        };
        let mut matrix = DMatrix::zeros(n, n + 1);
        for i in 0..n {
            matrix[(i, i)] = -area(e[i]) / volumes[i];
            matrix[(i, i + 1)] = area(e[i + 1]) / volumes[i];
        }
        Ok(Symbol::matrix_multiplication(matrix, child, domain.clone()))
    }

    fn integral(&self, child: &Symbol, submesh: &SubMesh) -> RSBMResult<Symbol> {
        let weight = match submesh.coord_sys {
            CoordinateSystem::Cartesian => 1.0,
            CoordinateSystem::Spherical => 4.0 * PI,
        };
        let volumes = cell_volumes(submesh) * weight;
        let row = DMatrix::from_row_slice(1, volumes.len(), volumes.as_slice());
        Ok(Symbol::matrix_multiplication(
            row,
            child,
            DomainSet::empty(),
        ))
    }

    fn boundary_value(
        &self,
        child: &Symbol,
        side: Side,
        submesh: &SubMesh,
        conditions: Option<&BoundaryConditions>,
        on_edges: bool,
    ) -> RSBMResult<Symbol> {
        let n = submesh.npts();
        let x = &submesh.nodes;
        let e = &submesh.edges;
        let empty = DomainSet::empty();

        if on_edges {
            let index = match side {
                Side::Left => 0,
                Side::Right => n,
            };
            return Ok(Symbol::matrix_multiplication(
                unit_row(n + 1, index),
                child,
                empty,
            ));
        }

        let (index, distance) = match side {
            Side::Left => (0, e[0] - x[0]),
            Side::Right => (n - 1, e[n] - x[n - 1]),
        };
        match conditions.and_then(|c| c.side(side)) {
            Some(bc) if bc.kind == BoundaryConditionType::Dirichlet => Ok(bc.value.clone()),
            Some(bc) => {
                // u_b = u_i + (e_b - x_i) du/dx
                let node = Symbol::matrix_multiplication(unit_row(n, index), child, empty);
                if bc.value.is_scalar_constant(0.0) {
                    Ok(node)
                } else {
                    node.add(&bc.value.mul(distance)?)
                }
            }
            None if n == 1 => Ok(Symbol::matrix_multiplication(unit_row(n, 0), child, empty)),
            None => {
                // Linear extrapolation from the two nodes nearest the boundary
                let (inner, h) = match side {
                    Side::Left => (1, x[1] - x[0]),
                    Side::Right => (n - 2, x[n - 1] - x[n - 2]),
                };
                let slope = distance / h;
                let mut row = DMatrix::zeros(1, n);
                match side {
                    Side::Left => {
                        // u_0 + (e_0 - x_0) (u_1 - u_0) / h
                        row[(0, index)] = 1.0 - slope;
                        row[(0, inner)] = slope;
                    }
                    Side::Right => {
                        // u_{n-1} + (e_n - x_{n-1}) (u_{n-1} - u_{n-2}) / h
                        row[(0, index)] = 1.0 + slope;
                        row[(0, inner)] = -slope;
                    }
                }
                Ok(Symbol::matrix_multiplication(row, child, empty))
            }
        }
    }

    fn node_to_edge(
        &self,
        child: &Symbol,
        domain: &DomainSet,
        submesh: &SubMesh,
    ) -> RSBMResult<Symbol> {
        let n = submesh.npts();
        let mut matrix = DMatrix::zeros(n + 1, n);
        matrix[(0, 0)] = 1.0;
        matrix[(n, n - 1)] = 1.0;
        for i in 1..n {
            matrix[(i, i - 1)] = 0.5;
            matrix[(i, i)] = 0.5;
        }
        Ok(Symbol::matrix_multiplication(matrix, child, domain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::domain::Domain;
    use crate::errors::ErrorKind;
    use crate::symbol::{Bindings, Value};
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    fn evaluate(symbol: &Symbol, y: &DVector<f64>) -> DVector<f64> {
        symbol
            .evaluate(&Bindings::new().with_state(y))
            .unwrap()
            .into_vector()
    }

    fn setup(n: usize, coord_sys: CoordinateSystem) -> (SubMesh, Symbol, DomainSet) {
        let submesh = SubMesh::uniform(0.0, 1.0, n, coord_sys).unwrap();
        let domain = DomainSet::from(Domain::NegativeParticle);
        let u = Symbol::state_vector("u", 0..n, domain.clone(), None);
        (submesh, u, domain)
    }

    #[test]
    fn gradient_of_linear_function_is_exact() {
        let (submesh, u, domain) = setup(5, CoordinateSystem::Cartesian);
        // u = 2x + 1, so u(0) = 1 and du/dx(1) = 2
        let y = DVector::from_iterator(5, submesh.nodes.iter().map(|x| 2.0 * x + 1.0));
        let bcs = BoundaryConditions::new(
            BoundaryCondition::dirichlet(1.0),
            BoundaryCondition::neumann(2.0),
        );
        let grad = FiniteVolume
            .gradient(&u, &domain, &submesh, GradientBoundary::Conditions(&bcs))
            .unwrap();
        let value = evaluate(&grad, &y);
        assert_eq!(value.len(), 6);
        assert_relative_eq!(value, DVector::from_element(6, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn point_submesh_has_no_differences() {
        let submesh = SubMesh::point();
        let domain = DomainSet::from(Domain::CurrentCollector);
        let u = Symbol::state_vector("u", 0..1, domain.clone(), None);
        let bcs = BoundaryConditions::zero_flux();
        let err = FiniteVolume
            .gradient(&u, &domain, &submesh, GradientBoundary::Conditions(&bcs))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        let flux = Symbol::state_vector("N", 0..2, domain.clone(), None);
        let err = FiniteVolume.divergence(&flux, &domain, &submesh).unwrap_err();
        assert!(err.to_string().contains("positive width"), "{}", err);
    }

    #[test]
    fn divergence_of_zero_flux_conserves() {
        let (submesh, u, domain) = setup(6, CoordinateSystem::Cartesian);
        let y = dvector![1.0, 3.0, 2.0, 5.0, 4.0, 0.5];
        let grad = FiniteVolume
            .gradient(
                &u,
                &domain,
                &submesh,
                GradientBoundary::Conditions(&BoundaryConditions::zero_flux()),
            )
            .unwrap();
        let div = FiniteVolume.divergence(&grad, &domain, &submesh).unwrap();
        let integral = FiniteVolume.integral(&div, &submesh).unwrap();
        assert_relative_eq!(evaluate(&integral, &y)[0], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn spherical_integral_of_one_is_sphere_volume() {
        let (submesh, u, _) = setup(10, CoordinateSystem::Spherical);
        let y = DVector::from_element(10, 1.0);
        let integral = FiniteVolume.integral(&u, &submesh).unwrap();
        assert_relative_eq!(evaluate(&integral, &y)[0], 4.0 * PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn spherical_divergence_of_radial_field() {
        // N = r gives div N = 3
        let (submesh, _, domain) = setup(8, CoordinateSystem::Spherical);
        let flux = Symbol::state_vector("N", 0..9, domain.clone(), None);
        let y = DVector::from_iterator(9, submesh.edges.iter().copied());
        let div = FiniteVolume.divergence(&flux, &domain, &submesh).unwrap();
        assert_relative_eq!(evaluate(&div, &y), DVector::from_element(8, 3.0), epsilon = 1e-10);
    }

    #[test]
    fn periodic_gradient_of_constant_is_zero() {
        let (submesh, u, domain) = setup(4, CoordinateSystem::Cartesian);
        let y = DVector::from_element(4, 7.0);
        let grad = FiniteVolume
            .gradient(&u, &domain, &submesh, GradientBoundary::Periodic)
            .unwrap();
        assert_relative_eq!(evaluate(&grad, &y), DVector::zeros(5), epsilon = 1e-12);
    }

    #[test]
    fn boundary_values() {
        let (submesh, u, _) = setup(4, CoordinateSystem::Cartesian);
        let y = DVector::from_iterator(4, submesh.nodes.iter().map(|x| 3.0 * x));

        // Linear extrapolation is exact for a linear profile
        let right = FiniteVolume
            .boundary_value(&u, Side::Right, &submesh, None, false)
            .unwrap();
        assert_relative_eq!(evaluate(&right, &y)[0], 3.0, epsilon = 1e-12);
        let left = FiniteVolume
            .boundary_value(&u, Side::Left, &submesh, None, false)
            .unwrap();
        assert_relative_eq!(evaluate(&left, &y)[0], 0.0, epsilon = 1e-12);

        // Neumann conditions extrapolate with the prescribed gradient
        let bcs = BoundaryConditions::new(
            BoundaryCondition::neumann(3.0),
            BoundaryCondition::neumann(3.0),
        );
        let right = FiniteVolume
            .boundary_value(&u, Side::Right, &submesh, Some(&bcs), false)
            .unwrap();
        assert_relative_eq!(evaluate(&right, &y)[0], 3.0, epsilon = 1e-12);

        // Dirichlet conditions give the prescribed value
        let bcs = BoundaryConditions::new(
            BoundaryCondition::dirichlet(-1.0),
            BoundaryCondition::dirichlet(5.0),
        );
        let left = FiniteVolume
            .boundary_value(&u, Side::Left, &submesh, Some(&bcs), false)
            .unwrap();
        assert_eq!(
            left.evaluate(&Bindings::new()).unwrap(),
            Value::Scalar(-1.0)
        );
    }

    #[test]
    fn node_to_edge_averages() {
        let (submesh, u, domain) = setup(3, CoordinateSystem::Cartesian);
        let y = dvector![1.0, 2.0, 4.0];
        let edges = FiniteVolume.node_to_edge(&u, &domain, &submesh).unwrap();
        assert_relative_eq!(evaluate(&edges, &y), dvector![1.0, 1.5, 3.0, 4.0]);
    }
}
