//! Conversion of a continuous [`Model`] into a system of equations over one state vector
//!
//! Discretisation is done in a few steps:
//!
//! 1. The model is checked for well-posedness, and every domain it uses must have a
//!    spatial method and a submesh.
//! 2. Every governed variable is assigned a contiguous range of the state vector
//!    ([`StateLayout`]).
//! 3. Every expression is rewritten bottom-up: variables become slices of the state
//!    vector and spatial operators become the matrices of the spatial method registered
//!    for their domain. Boundary conditions are discretised first and used by the operators
//!    that read across the boundary.
//! 4. The mass matrix, the stacked right-hand sides and the initial state are assembled
//!    into a [`DiscretisedModel`].
//!
//! The source model is not modified, and discretising it again gives the same result.
//!
//! ```rust
//! use rsbm_core::boundary::BoundaryConditions;
//! use rsbm_core::discretisation::Discretisation;
//! use rsbm_core::domain::Domain;
//! use rsbm_core::mesh::{Geometry, Mesh};
//! use rsbm_core::model::ModelBuilder;
//! use rsbm_core::spatial_methods::{FiniteVolume, SpatialMethods};
//! use rsbm_core::symbol::Symbol;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let c = Symbol::variable("c", Domain::Separator);
//! let model = ModelBuilder::new()
//!     .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
//!     .with_initial_condition(&c, 1.0)
//!     .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
//!     .build()
//!     .unwrap();
//!
//! let geometry = Geometry::new().with_interval(Domain::Separator, 0.0, 1.0);
//! let mesh = Mesh::new(&geometry, &BTreeMap::from([(Domain::Separator, 10)])).unwrap();
//! let methods = SpatialMethods::new().with_method(Domain::Separator, Arc::new(FiniteVolume));
//!
//! let discretised = Discretisation::new(mesh, methods).process_model(&model).unwrap();
//! assert_eq!(discretised.initial_state().len(), 10);
//! assert_eq!(discretised.slice_of("c").unwrap(), 0..10);
//! ```

mod discretised_model;
mod rewrite;
mod state_layout;

pub use discretised_model::DiscretisedModel;
pub use state_layout::{StateLayout, StateSlice};

use crate::domain::{Domain, DomainSet};
use crate::errors::{RSBMError, RSBMResult};
use crate::mesh::Mesh;
use crate::model::{EquationKind, Model};
use crate::parameters::ParameterValues;
use crate::spatial_methods::SpatialMethods;
use crate::symbol::{Bindings, Side, Symbol};
use crate::variables::Variables;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use rewrite::Rewriter;
use std::collections::BTreeSet;

/// A mesh together with the spatial method to use on each of its domains
#[derive(Debug, Clone)]
pub struct Discretisation {
    mesh: Mesh,
    spatial_methods: SpatialMethods,
    parameters: ParameterValues,
}

impl Discretisation {
    pub fn new(mesh: Mesh, spatial_methods: SpatialMethods) -> Self {
        Self {
            mesh,
            spatial_methods,
            parameters: ParameterValues::new(),
        }
    }

    /// Values for parameters left in the model
    ///
    /// They are used to evaluate initial conditions, and are carried over to the
    /// discretised model.
    pub fn with_parameters(mut self, parameters: ParameterValues) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn spatial_methods(&self) -> &SpatialMethods {
        &self.spatial_methods
    }

    /// Discretise `model`
    pub fn process_model(&self, model: &Model) -> RSBMResult<DiscretisedModel> {
        model.check_well_posedness()?;
        self.check_domains(model)?;

        let layout = StateLayout::new(model, &self.mesh)?;
        let n = layout.len();
        let mut rewriter = Rewriter::new(model, &self.mesh, &self.spatial_methods, &layout);

        let mut rhs = Vec::with_capacity(model.rhs().len());
        for (key, expression) in model.rhs() {
            debug!("discretising d({})/dt", key.name());
            rhs.push(rewriter.process_on(expression, key.domain())?);
        }
        let mut algebraic = Vec::with_capacity(model.algebraic().len());
        for (key, expression) in model.algebraic() {
            debug!("discretising algebraic equation for {}", key.name());
            algebraic.push(rewriter.process_on(expression, key.domain())?);
        }

        let mass_matrix = self.mass_matrix(&layout)?;

        let mut initial_state = DVector::zeros(n);
        let bindings = Bindings::new().with_parameters(&self.parameters);
        for (key, _) in model.equations() {
            let range = layout.range_of_key(key)?;
            let condition = model.initial_condition(key).ok_or_else(|| {
                RSBMError::Model(format!("no initial condition for '{}'", key))
            })?;
            let value = rewriter.process(condition)?.evaluate(&bindings)?;
            let values = match value.as_scalar() {
                Some(x) => DVector::from_element(range.len(), x),
                None if value.len() == range.len() => value.into_vector(),
                None => {
                    return Err(RSBMError::ShapeMismatch {
                        symbol: format!("initial condition of {}", key.name()),
                        expected: range.len(),
                        found: value.len(),
                    })
                }
            };
            initial_state.rows_mut(range.start, range.len()).copy_from(&values);
        }

        let mut variables = Variables::new();
        for (name, symbol) in model.variables() {
            variables.insert(name.clone(), rewriter.process_output(symbol)?);
        }

        info!(
            "discretised '{}': {} states ({} algebraic), {} output variables",
            model.name(),
            n,
            layout
                .iter()
                .filter(|s| s.kind == EquationKind::Algebraic)
                .map(|s| s.range.len())
                .sum::<usize>(),
            variables.len()
        );

        let rhs = Symbol::numeric_concatenation(rhs, DomainSet::empty());
        let algebraic = Symbol::numeric_concatenation(algebraic, DomainSet::empty());
        let equations =
            Symbol::numeric_concatenation(vec![rhs.clone(), algebraic.clone()], DomainSet::empty());
        Ok(DiscretisedModel {
            name: model.name().to_string(),
            layout,
            mass_matrix,
            initial_state,
            rhs,
            algebraic,
            equations,
            variables,
            parameters: self.parameters.clone(),
        })
    }

    /// Check that every domain used by `model` can be discretised
    fn check_domains(&self, model: &Model) -> RSBMResult<()> {
        let mut domains: BTreeSet<Domain> = BTreeSet::new();
        let mut collect = |symbol: &Symbol| {
            symbol.visit(&mut |s| domains.extend(s.domain().iter().copied()));
        };
        for (key, expression) in model.equations().chain(model.initial_conditions()) {
            collect(key);
            collect(expression);
        }
        for (key, conditions) in model.boundary_conditions() {
            collect(key);
            for side in [Side::Left, Side::Right] {
                if let Some(bc) = conditions.side(side) {
                    collect(&bc.value);
                }
            }
        }
        for (_, symbol) in model.variables() {
            collect(symbol);
        }

        if let Some(domain) = domains
            .iter()
            .find(|d| !self.spatial_methods.contains(**d))
        {
            return Err(RSBMError::MissingSpatialMethod { domain: *domain });
        }
        if let Some(domain) = domains.iter().find(|d| !self.mesh.contains(**d)) {
            return Err(RSBMError::MeshMissingDomain { domain: *domain });
        }
        Ok(())
    }

    /// Identity blocks for differential variables, zero rows for algebraic ones
    fn mass_matrix(&self, layout: &StateLayout) -> RSBMResult<DMatrix<f64>> {
        let n = layout.len();
        let mut mass = DMatrix::zeros(n, n);
        for slice in layout.iter() {
            if slice.kind == EquationKind::Algebraic {
                continue;
            }
            let domain = slice.variable.domain();
            let block = if domain.is_empty() {
                DMatrix::identity(1, 1)
            } else {
                let method = self.spatial_methods.get(domain)?;
                method.mass_matrix(&self.mesh.combine(domain)?)
            };
            let (start, len) = (slice.range.start, slice.range.len());
            mass.view_mut((start, start), (len, len)).copy_from(&block);
        }
        Ok(mass)
    }
}

/// Discretise `model` on `mesh` with `spatial_methods`
pub fn discretise(
    model: &Model,
    mesh: &Mesh,
    spatial_methods: &SpatialMethods,
) -> RSBMResult<DiscretisedModel> {
    Discretisation::new(mesh.clone(), spatial_methods.clone()).process_model(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryCondition, BoundaryConditions};
    use crate::errors::ErrorKind;
    use crate::mesh::Geometry;
    use crate::model::ModelBuilder;
    use crate::spatial_methods::{FiniteVolume, ZeroDimensional};
    use crate::symbol::{Parameter, Variable};
    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn cell_mesh() -> Mesh {
        let geometry = Geometry::new()
            .with_interval(Domain::NegativeElectrode, 0.0, 0.4)
            .with_interval(Domain::Separator, 0.4, 0.6)
            .with_interval(Domain::PositiveElectrode, 0.6, 1.0)
            .with_point(Domain::CurrentCollector);
        let points = BTreeMap::from([
            (Domain::NegativeElectrode, 4),
            (Domain::Separator, 2),
            (Domain::PositiveElectrode, 4),
        ]);
        Mesh::new(&geometry, &points).unwrap()
    }

    fn methods() -> SpatialMethods {
        SpatialMethods::new()
            .with_method(Domain::NegativeElectrode, Arc::new(FiniteVolume))
            .with_method(Domain::Separator, Arc::new(FiniteVolume))
            .with_method(Domain::PositiveElectrode, Arc::new(FiniteVolume))
            .with_method(Domain::CurrentCollector, Arc::new(ZeroDimensional))
    }

    #[test]
    fn layout_and_mass_matrix() {
        let x = Symbol::variable("x", DomainSet::empty());
        let c = Symbol::variable("c", Domain::NegativeElectrode);
        let z = Symbol::variable("z", DomainSet::empty());
        let model = ModelBuilder::new()
            .with_rhs(&x, &x.neg())
            .with_rhs(&c, &c.mul(&x).unwrap())
            .with_algebraic(&z, &z.sub(&x).unwrap())
            .with_initial_condition(&x, 2.0)
            .with_initial_condition(&c, 0.5)
            .with_initial_condition(&z, 2.0)
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();

        assert_eq!(discretised.slice_of("x").unwrap(), 0..1);
        assert_eq!(discretised.slice_of("c").unwrap(), 1..5);
        assert_eq!(discretised.slice_of("z").unwrap(), 5..6);
        assert!(discretised.is_dae());

        let mut expected = DMatrix::identity(6, 6);
        expected[(5, 5)] = 0.0;
        assert_eq!(discretised.mass_matrix(), &expected);
        assert_eq!(
            discretised.initial_state(),
            &dvector![2.0, 0.5, 0.5, 0.5, 0.5, 2.0]
        );

        let y = discretised.initial_state().clone();
        let f = discretised.rhs_algebraic(0.0, &y).unwrap();
        assert_relative_eq!(f, dvector![-2.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn concatenated_keys_share_one_range() {
        let n = Symbol::variable("c_n", Domain::NegativeElectrode);
        let s = Symbol::variable("c_s", Domain::Separator);
        let p = Symbol::variable("c_p", Domain::PositiveElectrode);
        let c = Symbol::concatenate(&[n, s, p]).unwrap();
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
            .with_variable("Average concentration", &crate::symbol::x_average(&c).unwrap())
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();

        assert_eq!(discretised.slice_of("c_s").unwrap(), 4..6);
        let y = discretised.initial_state().clone();
        assert_relative_eq!(
            discretised.rhs_algebraic(0.0, &y).unwrap(),
            DVector::zeros(10),
            epsilon = 1e-12
        );
        let average = discretised
            .evaluate_variable("Average concentration", 0.0, &y)
            .unwrap();
        assert_relative_eq!(average.as_scalar().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn dirichlet_conditions_drive_the_solution() {
        let c = Symbol::variable("c", Domain::Separator);
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_initial_condition(&c, 0.0)
            .with_boundary_conditions(
                &c,
                BoundaryConditions::new(
                    BoundaryCondition::dirichlet(1.0),
                    BoundaryCondition::neumann(0.0),
                ),
            )
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();
        let y = discretised.initial_state().clone();
        let f = discretised.rhs_algebraic(0.0, &y).unwrap();
        // Only the cell next to the Dirichlet boundary changes at first
        assert!(f[0] > 0.0);
        assert_eq!(f[1], 0.0);
    }

    #[test]
    fn parameters_are_bound_at_evaluation() {
        let x = Symbol::variable("x", DomainSet::empty());
        let model = ModelBuilder::new()
            .with_rhs(&x, &Symbol::parameter("k").mul(&x).unwrap().neg())
            .with_initial_condition(&x, &Symbol::parameter("x0"))
            .build()
            .unwrap();
        let discretisation = Discretisation::new(cell_mesh(), methods());

        let err = discretisation.process_model(&model).unwrap_err();
        assert!(matches!(err, RSBMError::UnboundSymbol { .. }));

        let discretised = discretisation
            .with_parameters(ParameterValues::from([("x0", 3.0)]))
            .process_model(&model)
            .unwrap();
        assert_eq!(discretised.initial_state(), &dvector![3.0]);
        let discretised = discretised.with_parameter_values(ParameterValues::from([("k", 2.0)]));
        assert_relative_eq!(
            discretised.rhs_algebraic(0.0, &dvector![3.0]).unwrap(),
            dvector![-6.0]
        );
    }

    #[test]
    fn families_are_kept() {
        let c = Variable::new("c")
            .domain(Domain::NegativeElectrode)
            .family("small")
            .build();
        let k = Parameter::new("k").family("small").build();
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.mul(&k).unwrap())
            .with_initial_condition(&c, 1.0)
            .with_variable("c", &c)
            .with_variable("rate", &c.mul(&k).unwrap())
            .build()
            .unwrap();
        let discretised = Discretisation::new(cell_mesh(), methods())
            .with_parameters(ParameterValues::from([("k", 1.0)]))
            .process_model(&model)
            .unwrap();
        for name in ["c", "rate"] {
            let symbol = discretised.variables().get(name).unwrap();
            assert_eq!(symbol.family().unwrap().name(), "small");
        }
    }

    #[test]
    fn missing_spatial_method() {
        let c = Symbol::variable("c", Domain::Separator);
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.neg())
            .with_initial_condition(&c, 1.0)
            .build()
            .unwrap();
        let err = discretise(&model, &cell_mesh(), &SpatialMethods::new()).unwrap_err();
        assert_eq!(err, RSBMError::MissingSpatialMethod { domain: Domain::Separator });
        assert_eq!(err.kind(), ErrorKind::Model);

        let err = discretise(&model, &Mesh::default(), &methods()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn shape_hint_must_match_mesh() {
        let c = Variable::new("c")
            .domain(Domain::Separator)
            .shape_hint(5)
            .build();
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.neg())
            .with_initial_condition(&c, 1.0)
            .build()
            .unwrap();
        let err = discretise(&model, &cell_mesh(), &methods()).unwrap_err();
        assert_eq!(
            err,
            RSBMError::ShapeMismatch {
                symbol: "c".to_string(),
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn initial_condition_of_wrong_length() {
        let c = Symbol::variable("c", Domain::Separator);
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.neg())
            .with_initial_condition(
                &c,
                Symbol::vector(dvector![1.0, 2.0, 3.0], Domain::Separator),
            )
            .build()
            .unwrap();
        let err = discretise(&model, &cell_mesh(), &methods()).unwrap_err();
        assert!(matches!(err, RSBMError::ShapeMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn gradient_on_lumped_domain_is_not_implemented() {
        let c = Symbol::variable("c", Domain::CurrentCollector);
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
            .build()
            .unwrap();
        let err = discretise(&model, &cell_mesh(), &methods()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn edge_valued_operands_are_shifted() {
        // D(c) grad(c) with D depending on c
        let c = Symbol::variable("c", Domain::Separator);
        let diffusivity = c.mul(2.0).unwrap();
        let flux = diffusivity.mul(&c.gradient().unwrap()).unwrap();
        let model = ModelBuilder::new()
            .with_rhs(&c, &flux.divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();
        let y = dvector![1.0, 3.0];
        let f = discretised.rhs_algebraic(0.0, &y).unwrap();
        // Flux through the middle edge is 2 * 2 * (3 - 1) / 0.1, and no flux leaves the domain
        assert_relative_eq!(f, dvector![800.0, -800.0], epsilon = 1e-9);

        // Divergence of a node-valued quantity is rejected
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .build()
            .unwrap();
        let err = discretise(&model, &cell_mesh(), &methods()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[test]
    fn boundary_values_and_edge_valued_outputs() {
        let c = Symbol::variable("c", Domain::Separator);
        let surface = c.boundary_value(Side::Right).unwrap();
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_boundary_conditions(
                &c,
                BoundaryConditions::new(
                    BoundaryCondition::neumann(0.0),
                    BoundaryCondition::neumann(surface.neg()),
                ),
            )
            .with_variable("Flux", &c.gradient().unwrap().neg())
            .with_variable("Surface", &surface)
            .with_variable("Left", &c.boundary_value(Side::Left).unwrap())
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();
        let y = dvector![1.0, 3.0];

        // The right condition reads the boundary value back, so the value is extrapolated
        let surface = discretised.evaluate_variable("Surface", 0.0, &y).unwrap();
        assert_relative_eq!(surface.as_scalar().unwrap(), 4.0, epsilon = 1e-12);
        let left = discretised.evaluate_variable("Left", 0.0, &y).unwrap();
        assert_relative_eq!(left.as_scalar().unwrap(), 1.0, epsilon = 1e-12);

        let flux = discretised.evaluate_variable("Flux", 0.0, &y).unwrap();
        assert_relative_eq!(flux.into_vector(), dvector![0.0, -20.0, 4.0], epsilon = 1e-9);
    }

    #[test]
    fn state_dependent_neumann_condition_sets_boundary_value() {
        let c = Symbol::variable("c", Domain::Separator);
        let x = Symbol::variable("x", DomainSet::empty());
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_rhs(&x, &Symbol::scalar(0.0))
            .with_initial_condition(&c, 1.0)
            .with_initial_condition(&x, 2.0)
            .with_boundary_conditions(
                &c,
                BoundaryConditions::new(
                    BoundaryCondition::neumann(0.0),
                    BoundaryCondition::neumann(x.clone()),
                ),
            )
            .with_variable("Surface", &c.boundary_value(Side::Right).unwrap())
            .build()
            .unwrap();
        let discretised = discretise(&model, &cell_mesh(), &methods()).unwrap();
        let y = discretised.initial_state().clone();

        // u_1 + (e_2 - x_1) x
        let surface = discretised.evaluate_variable("Surface", 0.0, &y).unwrap();
        assert_relative_eq!(surface.as_scalar().unwrap(), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn self_referencing_boundary_condition_is_rejected() {
        let c = Symbol::variable("c", Domain::Separator);
        let total_gradient = c.gradient().unwrap().integral().unwrap();
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_boundary_conditions(
                &c,
                BoundaryConditions::new(
                    BoundaryCondition::neumann(0.0),
                    BoundaryCondition::dirichlet(total_gradient),
                ),
            )
            .build()
            .unwrap();
        model.check_well_posedness().unwrap();

        let err = discretise(&model, &cell_mesh(), &methods()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
        assert!(err.to_string().contains("depend on themselves"), "{}", err);
    }

    #[test]
    fn deterministic() {
        let x = Symbol::variable("x", DomainSet::empty());
        let c = Symbol::variable("c", Domain::PositiveElectrode);
        let model = ModelBuilder::new()
            .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
            .with_rhs(&x, &c.integral().unwrap())
            .with_initial_condition(&c, 1.0)
            .with_initial_condition(&x, 0.0)
            .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
            .build()
            .unwrap();
        let first = discretise(&model, &cell_mesh(), &methods()).unwrap();
        let second = discretise(&model, &cell_mesh(), &methods()).unwrap();
        assert_eq!(first.mass_matrix(), second.mass_matrix());
        assert_eq!(first.initial_state(), second.initial_state());
        for name in ["c", "x"] {
            assert_eq!(first.slice_of(name).unwrap(), second.slice_of(name).unwrap());
        }
        let y = first.initial_state().clone();
        assert_eq!(
            first.rhs_algebraic(0.0, &y).unwrap(),
            second.rhs_algebraic(0.0, &y).unwrap()
        );
        assert_eq!(
            first.evaluate_variable("missing", 0.0, &y).unwrap_err().kind(),
            ErrorKind::Model
        );
    }
}
