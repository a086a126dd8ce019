//! Diffusion of lithium ions in the electrolyte
//!
//! The electrolyte concentration is one unknown spanning the negative electrode, the
//! separator and the positive electrode. Each region has its own variable; the equation is
//! keyed on their concatenation.

use super::electrolyte_conductivity::total_interfacial_current_density;
use super::{faraday_constant, surface_area_to_volume_ratio};
use rsbm_core::boundary::BoundaryConditions;
use rsbm_core::domain::{Domain, Electrode};
use rsbm_core::errors::RSBMResult;
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::{x_average, Parameter, Symbol, Variable};
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub const ELECTROLYTE_CONCENTRATION: &str = "Electrolyte concentration [mol.m-3]";
pub const ELECTROLYTE_FLUX: &str = "Electrolyte flux [mol.m-2.s-1]";

const ELECTROLYTE_DIFFUSIVITY: &str = "Electrolyte diffusivity [m2.s-1]";
const TRANSFERENCE_NUMBER: &str = "Cation transference number";
const INITIAL_CONCENTRATION: &str = "Initial concentration in electrolyte [mol.m-3]";

const REGIONS: [Domain; 3] = [
    Domain::NegativeElectrode,
    Domain::Separator,
    Domain::PositiveElectrode,
];

/// `domain` with a capital letter, e.g. "Negative electrode"
fn capitalised(domain: Domain) -> String {
    let name = domain.name();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the electrolyte concentration in one region of the cell
pub fn electrolyte_concentration(domain: Domain) -> String {
    format!("Electrolyte concentration in the {} [mol.m-3]", domain.name())
}

pub fn x_averaged_electrolyte_concentration(domain: Domain) -> String {
    format!(
        "X-averaged electrolyte concentration in the {} [mol.m-3]",
        domain.name()
    )
}

fn porosity(domain: Domain) -> Symbol {
    Parameter::new(format!("{} porosity", capitalised(domain))).build()
}

/// Full diffusion of the electrolyte concentration
///
/// $$ \epsilon \frac{\partial c_e}{\partial t} = -\nabla \cdot N_e + \frac{(1 - t^+) a j}{F},
/// \quad N_e = -D_e \nabla c_e $$
///
/// with no flux through the current collectors. The interfacial current density `j` is
/// the total current density of each electrode, and zero in the separator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullElectrolyteDiffusion;

impl FullElectrolyteDiffusion {
    /// `(1 - t+) a j / F` on one electrode
    fn source(&self, electrode: Electrode, variables: &Variables) -> RSBMResult<Symbol> {
        let j = variables.get(&total_interfacial_current_density(electrode))?;
        let transferred = Symbol::scalar(1.0).sub(&Parameter::new(TRANSFERENCE_NUMBER).build())?;
        transferred
            .mul(&surface_area_to_volume_ratio(electrode)?)?
            .mul(j)?
            .div(&faraday_constant())?
            .broadcast(electrode.electrode_domain())
    }
}

#[typetag::serde]
impl SubModel for FullElectrolyteDiffusion {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let mut variables = Variables::new();
        let mut regions = Vec::with_capacity(REGIONS.len());
        for domain in REGIONS {
            let c = Variable::new(electrolyte_concentration(domain))
                .domain(domain)
                .build();
            variables.insert(x_averaged_electrolyte_concentration(domain), x_average(&c)?);
            variables.insert(electrolyte_concentration(domain), c.clone());
            regions.push(c);
        }
        variables.insert(ELECTROLYTE_CONCENTRATION, Symbol::concatenate(&regions)?);
        Ok(variables)
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let c_e = variables.get(ELECTROLYTE_CONCENTRATION)?;
        let flux = Parameter::new(ELECTROLYTE_DIFFUSIVITY)
            .build()
            .mul(&c_e.gradient()?)?
            .neg();
        Ok([(ELECTROLYTE_FLUX, flux)].into_iter().collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c_e = variables.get(ELECTROLYTE_CONCENTRATION)?;
        let flux = variables.get(ELECTROLYTE_FLUX)?;
        let source = Symbol::concatenate(&[
            self.source(Electrode::Negative, variables)?,
            Symbol::scalar(0.0).broadcast(Domain::Separator)?,
            self.source(Electrode::Positive, variables)?,
        ])?;
        let porosity = Symbol::concatenate(
            &REGIONS
                .iter()
                .map(|d| porosity(*d).broadcast(*d))
                .collect::<RSBMResult<Vec<_>>>()?,
        )?;
        let rate = flux.divergence()?.neg().add(&source)?.div(&porosity)?;
        Ok(vec![(c_e.clone(), rate)])
    }

    fn set_boundary_conditions(
        &self,
        variables: &Variables,
    ) -> RSBMResult<Vec<(Symbol, BoundaryConditions)>> {
        let c_e = variables.get(ELECTROLYTE_CONCENTRATION)?;
        Ok(vec![(c_e.clone(), BoundaryConditions::zero_flux())])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c_e = variables.get(ELECTROLYTE_CONCENTRATION)?;
        Ok(vec![(c_e.clone(), Parameter::new(INITIAL_CONCENTRATION).build())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsbm_core::domain::DomainSet;

    #[test]
    fn test_concentration_spans_the_cell() {
        let variables = FullElectrolyteDiffusion.get_fundamental_variables().unwrap();
        let c_e = variables.get(ELECTROLYTE_CONCENTRATION).unwrap();
        assert_eq!(c_e.domain(), &DomainSet::whole_cell());
        assert_eq!(c_e.variables().len(), 3);

        let average = variables
            .get(&x_averaged_electrolyte_concentration(Domain::Separator))
            .unwrap();
        assert!(average.domain().is_empty());
        assert_eq!(
            x_averaged_electrolyte_concentration(Domain::NegativeElectrode),
            "X-averaged electrolyte concentration in the negative electrode [mol.m-3]"
        );
        assert_eq!(capitalised(Domain::Separator), "Separator");
    }
}
