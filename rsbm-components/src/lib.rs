//! Reference submodels and models of lithium-ion cells
//!
//! The [`submodels`] each describe one piece of physics and communicate only through named
//! variables, so they can be combined freely through a
//! [`ModelBuilder`](rsbm_core::model::ModelBuilder). The [`models`] module assembles
//! complete cells from them according to [`ModelOptions`], and [`parameters`] provides a
//! default parameter set.
//!
//! ```rust
//! use rsbm_components::models::{default_discretisation, single_particle_model};
//! use rsbm_components::options::ModelOptions;
//! use rsbm_components::parameters::CellParameters;
//!
//! let model = single_particle_model(&ModelOptions::default()).unwrap();
//! let discretised = default_discretisation(&CellParameters::default())
//!     .unwrap()
//!     .process_model(&model)
//!     .unwrap();
//! assert!(!discretised.is_dae());
//! ```

pub mod models;
pub mod options;
pub mod parameters;
pub mod submodels;

pub use options::ModelOptions;
pub use parameters::CellParameters;
