//! Single particle model
//!
//! Each electrode is represented by one particle whose surface reacts with a uniform
//! interfacial current. The electrolyte concentration is resolved across the cell, while its
//! potential is uniform at leading order.

use crate::options::{ModelOptions, Particle, Plating};
use crate::parameters::CellParameters;
use crate::submodels::electrolyte_conductivity::LeadingOrderSurfaceForm;
use crate::submodels::electrolyte_diffusion::FullElectrolyteDiffusion;
use crate::submodels::external_circuit::{ControlFunction, CurrentControl, FunctionControl};
use crate::submodels::interface::ButlerVolmer;
use crate::submodels::li_plating::ReversiblePlating;
use crate::submodels::particle::{FickianParticle, UniformParticle};
use log::info;
use rsbm_core::discretisation::Discretisation;
use rsbm_core::domain::{Domain, Electrode};
use rsbm_core::errors::RSBMResult;
use rsbm_core::mesh::Mesh;
use rsbm_core::model::{Model, ModelBuilder, S};
use rsbm_core::spatial_methods::{FiniteVolume, SpatialMethods, ZeroDimensional};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SINGLE_PARTICLE_MODEL: &str = "Single Particle Model";

fn submodels(options: &ModelOptions) -> RSBMResult<Vec<S>> {
    let circuit: S = match ControlFunction::from_operating_mode(options.operating_mode) {
        None => Arc::new(CurrentControl),
        Some(control) => Arc::new(FunctionControl::new(control)),
    };
    let mut submodels = vec![circuit];
    for electrode in [Electrode::Negative, Electrode::Positive] {
        let particle: S = match options.particle {
            Particle::Fickian => Arc::new(FickianParticle::new(electrode)),
            Particle::Uniform => Arc::new(UniformParticle::new(electrode)),
        };
        submodels.push(particle);
        submodels.push(Arc::new(ButlerVolmer::new(electrode)));
        submodels.push(Arc::new(LeadingOrderSurfaceForm::new(
            electrode,
            options.surface_form,
        )));
    }
    submodels.push(Arc::new(FullElectrolyteDiffusion));
    match options.plating {
        Plating::None => {}
        Plating::Reversible => {
            submodels.push(Arc::new(ReversiblePlating::new(Electrode::Negative)?));
        }
    }
    Ok(submodels)
}

/// Assemble the single particle model for `options`
///
/// The model is not checked for well-posedness; discretising it does that.
pub fn single_particle_model(options: &ModelOptions) -> RSBMResult<Model> {
    let mut builder = ModelBuilder::new();
    builder.with_name(SINGLE_PARTICLE_MODEL);
    for submodel in submodels(options)? {
        builder.with_submodel(submodel);
    }
    let model = builder.build()?;
    info!("Built the {} with options {}", SINGLE_PARTICLE_MODEL, options);
    Ok(model)
}

/// Number of cells in each interval domain
pub fn default_submesh_points() -> BTreeMap<Domain, usize> {
    BTreeMap::from([
        (Domain::NegativeElectrode, 10),
        (Domain::Separator, 5),
        (Domain::PositiveElectrode, 10),
        (Domain::NegativeParticle, 10),
        (Domain::PositiveParticle, 10),
    ])
}

/// Finite volumes everywhere except the lumped current collector
pub fn default_spatial_methods() -> SpatialMethods {
    let finite_volume = Arc::new(FiniteVolume);
    let mut methods = SpatialMethods::new();
    for domain in [
        Domain::NegativeElectrode,
        Domain::Separator,
        Domain::PositiveElectrode,
        Domain::NegativeParticle,
        Domain::PositiveParticle,
    ] {
        methods.insert(domain, finite_volume.clone());
    }
    methods.with_method(Domain::CurrentCollector, Arc::new(ZeroDimensional))
}

/// Discretisation on the geometry of `parameters`, binding their values
pub fn default_discretisation(parameters: &CellParameters) -> RSBMResult<Discretisation> {
    let mesh = Mesh::new(&parameters.geometry(), &default_submesh_points())?;
    Ok(Discretisation::new(mesh, default_spatial_methods())
        .with_parameters(parameters.parameter_values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OperatingMode;

    #[test]
    fn test_submodels_follow_options() {
        let options = ModelOptions::default();
        assert_eq!(submodels(&options).unwrap().len(), 8);

        let options = options
            .with_operating_mode(OperatingMode::Power)
            .with_plating(Plating::Reversible);
        assert_eq!(submodels(&options).unwrap().len(), 9);
    }

    #[test]
    fn test_model_is_named() {
        let model = single_particle_model(&ModelOptions::default()).unwrap();
        assert_eq!(model.name(), SINGLE_PARTICLE_MODEL);
    }

    #[test]
    fn test_mesh_covers_every_method() {
        let discretisation = default_discretisation(&CellParameters::default()).unwrap();
        for domain in Domain::ALL {
            assert!(discretisation.mesh().contains(domain), "{}", domain);
            assert!(discretisation.spatial_methods().contains(domain), "{}", domain);
        }
        assert_eq!(discretisation.mesh().get(Domain::Separator).unwrap().npts(), 5);
        assert!(discretisation
            .mesh()
            .get(Domain::CurrentCollector)
            .unwrap()
            .is_point());
    }
}
