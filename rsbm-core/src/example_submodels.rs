#![allow(dead_code)]

use crate::boundary::BoundaryConditions;
use crate::domain::Domain;
use crate::errors::RSBMResult;
use crate::submodel::SubModel;
use crate::symbol::{Parameter, Symbol, Variable};
use crate::variables::Variables;
use serde::{Deserialize, Serialize};

/// Exponential decay of a lumped quantity, `dx/dt = -k x`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Decay {
    pub name: String,
    pub initial_value: f64,
}

impl Decay {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            initial_value: 1.0,
        }
    }
}

#[typetag::serde]
impl SubModel for Decay {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let x = Symbol::variable(self.name.clone(), crate::domain::DomainSet::empty());
        Ok([(self.name.clone(), x)].into_iter().collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let x = variables.get(&self.name)?;
        let rate = Parameter::new("Decay rate").build();
        Ok(vec![(x.clone(), rate.mul(x)?.neg())])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let x = variables.get(&self.name)?;
        Ok(vec![(x.clone(), Symbol::scalar(self.initial_value))])
    }
}

/// Linear diffusion on a single domain with zero-flux boundaries
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Diffusion {
    pub domain: Domain,
}

#[typetag::serde]
impl SubModel for Diffusion {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let c = Variable::new("Concentration").domain(self.domain).build();
        Ok([("Concentration", c)].into_iter().collect())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let c = variables.get("Concentration")?;
        let flux = c.gradient()?.neg();
        Ok([("Flux", flux)].into_iter().collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c = variables.get("Concentration")?;
        let flux = variables.get("Flux")?;
        Ok(vec![(c.clone(), flux.divergence()?.neg())])
    }

    fn set_boundary_conditions(
        &self,
        variables: &Variables,
    ) -> RSBMResult<Vec<(Symbol, BoundaryConditions)>> {
        let c = variables.get("Concentration")?;
        Ok(vec![(c.clone(), BoundaryConditions::zero_flux())])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c = variables.get("Concentration")?;
        Ok(vec![(c.clone(), Symbol::scalar(1.0))])
    }
}

/// Publishes a variable derived from the diffusion flux, so it can only be resolved after
/// [`Diffusion`]
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FluxMagnitude;

#[typetag::serde]
impl SubModel for FluxMagnitude {
    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let flux = variables.get("Flux")?;
        Ok([("Flux magnitude", flux.abs())].into_iter().collect())
    }
}

/// Requires a variable that nothing provides
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NeedsUnknown;

#[typetag::serde]
impl SubModel for NeedsUnknown {
    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        variables.get("Unknown quantity")?;
        Ok(Variables::new())
    }
}

/// Determines `z` algebraically from `x`: `0 = z - 2 x`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Follower {
    pub leader: String,
}

#[typetag::serde]
impl SubModel for Follower {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let z = Symbol::variable("z", crate::domain::DomainSet::empty());
        Ok([("z", z)].into_iter().collect())
    }

    fn set_algebraic(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let z = variables.get("z")?;
        let x = variables.get(&self.leader)?;
        Ok(vec![(z.clone(), z.sub(&x.mul(2.0)?)?)])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let z = variables.get("z")?;
        Ok(vec![(z.clone(), Symbol::scalar(2.0))])
    }
}
