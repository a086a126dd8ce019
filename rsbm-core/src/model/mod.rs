//! A model is a set of equations assembled from submodels.
//!
//! Submodels publish variables and contribute differential equations, algebraic equations,
//! initial conditions and boundary conditions for the variables they own.
//! The [`ModelBuilder`] resolves the couplings between submodels and freezes the result
//! into a [`Model`], which can be checked for well-posedness and then discretised.
//!
//! ```rust
//! use rsbm_core::boundary::BoundaryConditions;
//! use rsbm_core::domain::Domain;
//! use rsbm_core::model::{ModelBuilder, SolverKind};
//! use rsbm_core::symbol::Symbol;
//!
//! let c = Symbol::variable("Concentration", Domain::NegativeElectrode);
//! let flux = c.gradient().unwrap().neg();
//! let model = ModelBuilder::new()
//!     .with_rhs(&c, &flux.divergence().unwrap().neg())
//!     .with_initial_condition(&c, 1.0)
//!     .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
//!     .build()
//!     .unwrap();
//!
//! model.check_well_posedness().unwrap();
//! assert_eq!(model.default_solver(), SolverKind::Ode);
//! ```

mod assembled;
mod builder;
mod types;
pub mod validation;

#[cfg(test)]
mod tests;

// Public re-exports
pub use assembled::Model;
pub use builder::ModelBuilder;
pub use types::{DependencyGraph, EquationKind, SolverKind, S};
pub(crate) use types::state_variables;
