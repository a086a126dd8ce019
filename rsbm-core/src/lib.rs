pub mod boundary;
pub mod discretisation;
pub mod domain;
mod example_submodels;
pub mod ivp;
pub mod mesh;
pub mod model;
pub mod parameters;
pub mod spatial_methods;
pub mod submodel;
pub mod symbol;
pub mod variables;

pub mod errors;
