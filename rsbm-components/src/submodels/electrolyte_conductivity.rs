//! Leading-order electrolyte conductivity in surface form
//!
//! At leading order the electrolyte potential is uniform across the cell, so each electrode
//! is described by a single surface potential difference `delta_phi = phi_s - phi_e`. It is
//! determined by the balance between the total interfacial current demanded by the
//! external circuit and the current supplied by the reactions, either through the charging
//! of the double layer ([`SurfaceForm::Differential`]) or instantaneously
//! ([`SurfaceForm::Algebraic`]).
//!
//! One instance is registered per electrode, but the variables shared by the whole cell
//! (electrolyte potential and terminal voltage) and the boundary conditions of the
//! electrolyte potential are provided by the negative-electrode instance only.

use super::external_circuit::{CURRENT_DENSITY, TERMINAL_VOLTAGE};
use super::interface::{interfacial_current_density, open_circuit_potential};
use super::li_plating::PLATING_INTERFACIAL_CURRENT_DENSITY;
use super::particle::{initial_concentration, maximum_concentration};
use super::{electrode_parameter, surface_area_to_volume_ratio};
use crate::options::SurfaceForm;
use rsbm_core::boundary::BoundaryConditions;
use rsbm_core::domain::{DomainSet, Electrode};
use rsbm_core::errors::RSBMResult;
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::{Symbol, Variable};
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub const ELECTROLYTE_POTENTIAL: &str = "Electrolyte potential [V]";
pub const X_AVERAGED_ELECTROLYTE_POTENTIAL: &str = "X-averaged electrolyte potential [V]";

pub fn surface_potential_difference(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode surface potential difference [V]",
        electrode.name()
    )
}

pub fn total_interfacial_current_density(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode total interfacial current density [A.m-2]",
        electrode.name()
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadingOrderSurfaceForm {
    pub electrode: Electrode,
    pub formulation: SurfaceForm,
}

impl LeadingOrderSurfaceForm {
    pub fn new(electrode: Electrode, formulation: SurfaceForm) -> Self {
        Self {
            electrode,
            formulation,
        }
    }

    /// Total interfacial current minus the current carried by the reactions
    fn current_imbalance(&self, variables: &Variables) -> RSBMResult<Symbol> {
        let total = variables.get(&total_interfacial_current_density(self.electrode))?;
        let mut reactions = variables
            .get(&interfacial_current_density(self.electrode))?
            .clone();
        if self.electrode == Electrode::Negative
            && variables.contains(PLATING_INTERFACIAL_CURRENT_DENSITY)
        {
            reactions = reactions.add(variables.get(PLATING_INTERFACIAL_CURRENT_DENSITY)?)?;
        }
        total.sub(&reactions)
    }
}

#[typetag::serde]
impl SubModel for LeadingOrderSurfaceForm {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        let name = surface_potential_difference(self.electrode);
        let delta_phi = Variable::new(name.clone()).build();
        Ok([(name, delta_phi)].into_iter().collect())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let current_density = variables.get(CURRENT_DENSITY)?;
        // i = a L j in the negative electrode and -a L j in the positive one
        let thickness = electrode_parameter(self.electrode, "electrode thickness [m]");
        let total = current_density
            .div(&surface_area_to_volume_ratio(self.electrode)?.mul(&thickness)?)?;
        let total = match self.electrode {
            Electrode::Negative => total,
            Electrode::Positive => total.neg(),
        };
        let mut coupled: Variables = [(total_interfacial_current_density(self.electrode), total)]
            .into_iter()
            .collect();

        match self.electrode {
            Electrode::Negative => {
                let delta_phi_n =
                    variables.get(&surface_potential_difference(Electrode::Negative))?;
                let delta_phi_p =
                    variables.get(&surface_potential_difference(Electrode::Positive))?;
                // The negative current collector is grounded, phi_s_n = 0
                let phi_e = delta_phi_n.neg();
                coupled.insert(
                    ELECTROLYTE_POTENTIAL,
                    phi_e.broadcast(DomainSet::whole_cell())?,
                );
                coupled.insert(X_AVERAGED_ELECTROLYTE_POTENTIAL, phi_e);
                coupled.insert(TERMINAL_VOLTAGE, delta_phi_p.sub(delta_phi_n)?);
            }
            Electrode::Positive => {}
        }
        Ok(coupled)
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        match self.formulation {
            SurfaceForm::Differential => {
                let delta_phi = variables.get(&surface_potential_difference(self.electrode))?;
                let capacity =
                    electrode_parameter(self.electrode, "electrode double-layer capacity [F.m-2]");
                let rate = self.current_imbalance(variables)?.div(&capacity)?;
                Ok(vec![(delta_phi.clone(), rate)])
            }
            SurfaceForm::Algebraic => Ok(vec![]),
        }
    }

    fn set_algebraic(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        match self.formulation {
            SurfaceForm::Differential => Ok(vec![]),
            SurfaceForm::Algebraic => {
                let delta_phi = variables.get(&surface_potential_difference(self.electrode))?;
                Ok(vec![(delta_phi.clone(), self.current_imbalance(variables)?)])
            }
        }
    }

    fn set_boundary_conditions(
        &self,
        variables: &Variables,
    ) -> RSBMResult<Vec<(Symbol, BoundaryConditions)>> {
        match self.electrode {
            Electrode::Negative => {
                let phi_e = variables.get(ELECTROLYTE_POTENTIAL)?;
                Ok(vec![(phi_e.clone(), BoundaryConditions::zero_flux())])
            }
            Electrode::Positive => Ok(vec![]),
        }
    }

    /// The open-circuit potential of the initial particle concentration, so the reactions
    /// start at equilibrium
    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let delta_phi = variables.get(&surface_potential_difference(self.electrode))?;
        let stoichiometry =
            initial_concentration(self.electrode).div(&maximum_concentration(self.electrode))?;
        Ok(vec![(
            delta_phi.clone(),
            open_circuit_potential(self.electrode, &stoichiometry)?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsbm_core::symbol::Parameter;

    fn resolved(electrode: Electrode) -> RSBMResult<Variables> {
        let mut variables = Variables::new();
        for e in [Electrode::Negative, Electrode::Positive] {
            let submodel = LeadingOrderSurfaceForm::new(e, SurfaceForm::Differential);
            variables.extend_new(submodel.get_fundamental_variables()?);
        }
        variables.insert(CURRENT_DENSITY, Parameter::new("i").build());
        LeadingOrderSurfaceForm::new(electrode, SurfaceForm::Differential)
            .get_coupled_variables(&variables)
    }

    #[test]
    fn test_only_negative_electrode_provides_shared_variables() {
        let negative = resolved(Electrode::Negative).unwrap();
        let positive = resolved(Electrode::Positive).unwrap();
        for name in [ELECTROLYTE_POTENTIAL, X_AVERAGED_ELECTROLYTE_POTENTIAL, TERMINAL_VOLTAGE] {
            assert!(negative.contains(name), "{}", name);
            assert!(!positive.contains(name), "{}", name);
        }
        assert!(positive.contains(&total_interfacial_current_density(Electrode::Positive)));
        assert_eq!(
            negative.get(ELECTROLYTE_POTENTIAL).unwrap().domain(),
            &DomainSet::whole_cell()
        );
    }

    #[test]
    fn test_only_negative_electrode_sets_boundary_conditions() {
        let mut variables = resolved(Electrode::Negative).unwrap();
        variables.extend_new(resolved(Electrode::Positive).unwrap());

        let negative = LeadingOrderSurfaceForm::new(Electrode::Negative, SurfaceForm::Algebraic);
        let positive = LeadingOrderSurfaceForm::new(Electrode::Positive, SurfaceForm::Algebraic);
        assert_eq!(negative.set_boundary_conditions(&variables).unwrap().len(), 1);
        assert!(positive.set_boundary_conditions(&variables).unwrap().is_empty());
    }
}
