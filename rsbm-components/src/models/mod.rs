//! Complete cell models assembled from the reference submodels

mod spm;

pub use spm::{
    default_discretisation, default_spatial_methods, default_submesh_points,
    single_particle_model, SINGLE_PARTICLE_MODEL,
};
