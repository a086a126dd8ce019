//! Symbolic assembly and discretisation of continuum battery models
//!
//! Models are assembled from [`SubModel`](rsbm_core::submodel::SubModel)s into an expression
//! DAG, checked for well-posedness, and discretised onto a [`Mesh`](rsbm_core::mesh::Mesh) into
//! a system of differential-algebraic equations `M dy/dt = F(t, y)`.
//!
//! * [`rsbm_core`] holds the expression tree, model assembly, meshes, spatial methods and the
//!   discretisation engine.
//! * [`rsbm_components`] holds reference submodels of a lithium-ion cell and the single
//!   particle model built from them.
//!
//! ```rust
//! use approx::assert_relative_eq;
//! use rsbm::rsbm_components::models::{default_discretisation, single_particle_model};
//! use rsbm::rsbm_components::submodels::external_circuit::DISCHARGE_CAPACITY;
//! use rsbm::rsbm_components::{CellParameters, ModelOptions};
//! use rsbm::rsbm_core::ivp::integrate_rk4;
//!
//! let model = single_particle_model(&ModelOptions::default()).unwrap();
//! let discretised = default_discretisation(&CellParameters::default())
//!     .unwrap()
//!     .process_model(&model)
//!     .unwrap();
//! let trajectory = integrate_rk4(&discretised, 0.0, 0.1, 1e-3).unwrap();
//! let capacity = trajectory.evaluate_variable(DISCHARGE_CAPACITY).unwrap();
//! let last = capacity.last().and_then(|v| v.as_scalar()).unwrap();
//! assert_relative_eq!(last, 5.0 * 0.1 / 3600.0, max_relative = 1e-8);
//! ```

pub use rsbm_components;
pub use rsbm_core;

pub use rsbm_core::errors::{RSBMError, RSBMResult};
