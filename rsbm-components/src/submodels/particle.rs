//! Lithium transport inside the active material particles
//!
//! Both submodels describe one representative particle per electrode, whose concentration
//! is the average over the electrode thickness. The interfacial current density read from
//! [`interface`](super::interface) sets the flux through the particle surface.

use super::interface::interfacial_current_density;
use super::{electrode_parameter, faraday_constant};
use rsbm_core::boundary::{BoundaryCondition, BoundaryConditions};
use rsbm_core::domain::Electrode;
use rsbm_core::errors::RSBMResult;
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::{x_average, Parameter, Side, Symbol, Variable};
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub fn particle_concentration(electrode: Electrode) -> String {
    format!("X-averaged {} particle concentration [mol.m-3]", electrode.name())
}

pub fn particle_surface_concentration(electrode: Electrode) -> String {
    format!(
        "X-averaged {} particle surface concentration [mol.m-3]",
        electrode.name()
    )
}

pub fn average_particle_concentration(electrode: Electrode) -> String {
    format!("Average {} particle concentration [mol.m-3]", electrode.name())
}

pub fn particle_flux(electrode: Electrode) -> String {
    format!("X-averaged {} particle flux [mol.m-2.s-1]", electrode.name())
}

/// Initial concentration of lithium in the active material of `electrode`
pub fn initial_concentration(electrode: Electrode) -> Symbol {
    Parameter::new(format!(
        "Initial concentration in {} electrode [mol.m-3]",
        electrode.name()
    ))
    .build()
}

/// Maximum concentration of lithium in the active material of `electrode`
pub fn maximum_concentration(electrode: Electrode) -> Symbol {
    Parameter::new(format!(
        "Maximum concentration in {} electrode [mol.m-3]",
        electrode.name()
    ))
    .build()
}

fn initial_conditions(
    electrode: Electrode,
    variables: &Variables,
) -> RSBMResult<Vec<(Symbol, Symbol)>> {
    let c = variables.get(&particle_concentration(electrode))?;
    Ok(vec![(c.clone(), initial_concentration(electrode))])
}

/// Fickian diffusion in a spherical particle
///
/// $$ \frac{\partial c}{\partial t} = -\nabla \cdot N, \quad N = -D \nabla c $$
///
/// with no flux at the centre and `N = j / F` at the surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FickianParticle {
    pub electrode: Electrode,
}

impl FickianParticle {
    pub fn new(electrode: Electrode) -> Self {
        Self { electrode }
    }

    fn diffusivity(&self) -> Symbol {
        electrode_parameter(self.electrode, "particle diffusivity [m2.s-1]")
    }
}

#[typetag::serde]
impl SubModel for FickianParticle {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let c = Variable::new(particle_concentration(self.electrode))
            .domain(self.electrode.particle_domain())
            .build();
        Ok([(particle_concentration(self.electrode), c)]
            .into_iter()
            .collect())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let c = variables.get(&particle_concentration(self.electrode))?;
        let flux = self.diffusivity().mul(&c.gradient()?)?.neg();
        Ok([
            (
                particle_surface_concentration(self.electrode),
                c.boundary_value(Side::Right)?,
            ),
            (average_particle_concentration(self.electrode), x_average(c)?),
            (particle_flux(self.electrode), flux),
        ]
        .into_iter()
        .collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c = variables.get(&particle_concentration(self.electrode))?;
        let flux = variables.get(&particle_flux(self.electrode))?;
        Ok(vec![(c.clone(), flux.divergence()?.neg())])
    }

    fn set_boundary_conditions(
        &self,
        variables: &Variables,
    ) -> RSBMResult<Vec<(Symbol, BoundaryConditions)>> {
        let c = variables.get(&particle_concentration(self.electrode))?;
        let j = variables.get(&interfacial_current_density(self.electrode))?;
        // -D dc/dr = j / F at the surface
        let surface_gradient = j
            .div(&faraday_constant().mul(&self.diffusivity())?)?
            .neg();
        Ok(vec![(
            c.clone(),
            BoundaryConditions::new(
                BoundaryCondition::neumann(0.0),
                BoundaryCondition::neumann(surface_gradient),
            ),
        )])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        initial_conditions(self.electrode, variables)
    }
}

/// Uniform concentration in each particle
///
/// The particle is a well-mixed volume: `dc/dt = -3 j / (F R)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformParticle {
    pub electrode: Electrode,
}

impl UniformParticle {
    pub fn new(electrode: Electrode) -> Self {
        Self { electrode }
    }
}

#[typetag::serde]
impl SubModel for UniformParticle {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let c = Variable::new(particle_concentration(self.electrode)).build();
        Ok([
            (particle_concentration(self.electrode), c.clone()),
            (particle_surface_concentration(self.electrode), c.clone()),
            (average_particle_concentration(self.electrode), c),
        ]
        .into_iter()
        .collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c = variables.get(&particle_concentration(self.electrode))?;
        let j = variables.get(&interfacial_current_density(self.electrode))?;
        let radius = electrode_parameter(self.electrode, "particle radius [m]");
        let rate = j.mul(3.0)?.div(&faraday_constant().mul(&radius)?)?.neg();
        Ok(vec![(c.clone(), rate)])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        initial_conditions(self.electrode, variables)
    }
}
