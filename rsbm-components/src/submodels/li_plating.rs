//! Lithium plating on the negative electrode
//!
//! Metallic lithium plated on the particle surfaces is tracked as a concentration per unit
//! electrode volume. Plating and stripping draw current from the same interface as the
//! intercalation reaction, so the surface form of the electrolyte conductivity adds the
//! plating current to its balance when it is present.

use super::electrolyte_conductivity::surface_potential_difference;
use super::electrolyte_diffusion::x_averaged_electrolyte_concentration;
use super::{faraday_constant, surface_area_to_volume_ratio, thermal_voltage};
use log::debug;
use rsbm_core::domain::Electrode;
use rsbm_core::errors::{RSBMError, RSBMResult};
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::{Parameter, Symbol, Variable};
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub const PLATED_LITHIUM_CONCENTRATION: &str = "X-averaged lithium plating concentration [mol.m-3]";
pub const PLATING_INTERFACIAL_CURRENT_DENSITY: &str =
    "X-averaged lithium plating interfacial current density [A.m-2]";
pub const PLATING_OVERPOTENTIAL: &str = "X-averaged lithium plating overpotential [V]";

const RATE_CONSTANT: &str = "Lithium plating kinetic rate constant [m.s-1]";
const TRANSFER_COEFFICIENT: &str = "Lithium plating transfer coefficient";
const INITIAL_PLATED_LITHIUM: &str = "Initial plated lithium concentration [mol.m-3]";

/// Reversible plating and stripping
///
/// $$ j_{sr} = F k \left( c_{Li} e^{\alpha F \eta / R T} - c_e e^{-(1 - \alpha) F \eta / R T}
/// \right), \quad \frac{d c_{Li}}{d t} = -\frac{a j_{sr}}{F} $$
///
/// where the overpotential `eta` is measured against lithium metal. Stripping stops as the
/// plated lithium runs out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversiblePlating {
    pub electrode: Electrode,
}

impl ReversiblePlating {
    pub fn new(electrode: Electrode) -> RSBMResult<Self> {
        check_electrode(electrode)?;
        Ok(Self { electrode })
    }
}

fn check_electrode(electrode: Electrode) -> RSBMResult<()> {
    match electrode {
        Electrode::Negative => Ok(()),
        Electrode::Positive => Err(RSBMError::NotImplemented(
            "Li plating models are not implemented for the positive electrode".to_string(),
        )),
    }
}

#[typetag::serde]
impl SubModel for ReversiblePlating {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        // A deserialised instance skips `new`
        check_electrode(self.electrode)?;
        let c_li = Variable::new(PLATED_LITHIUM_CONCENTRATION).build();
        Ok([(PLATED_LITHIUM_CONCENTRATION, c_li)].into_iter().collect())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let c_li = variables.get(PLATED_LITHIUM_CONCENTRATION)?;
        let c_e = variables.get(&x_averaged_electrolyte_concentration(
            self.electrode.electrode_domain(),
        ))?;
        // Lithium metal sits at the potential of the electrolyte
        let eta = variables
            .get(&surface_potential_difference(self.electrode))?
            .clone();

        let alpha = Parameter::new(TRANSFER_COEFFICIENT).build();
        let scaled = eta.div(&thermal_voltage()?)?;
        let stripping = c_li.mul(&alpha.mul(&scaled)?.exp())?;
        let plating = c_e.mul(&Symbol::scalar(1.0).sub(&alpha)?.neg().mul(&scaled)?.exp())?;
        let j = faraday_constant()
            .mul(&Parameter::new(RATE_CONSTANT).build())?
            .mul(&stripping.sub(&plating)?)?;
        debug!("Reversible lithium plating resolved in the {} electrode", self.electrode);

        Ok([
            (PLATING_OVERPOTENTIAL, eta),
            (PLATING_INTERFACIAL_CURRENT_DENSITY, j),
        ]
        .into_iter()
        .collect())
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c_li = variables.get(PLATED_LITHIUM_CONCENTRATION)?;
        let j = variables.get(PLATING_INTERFACIAL_CURRENT_DENSITY)?;
        let rate = surface_area_to_volume_ratio(self.electrode)?
            .mul(j)?
            .div(&faraday_constant())?
            .neg();
        Ok(vec![(c_li.clone(), rate)])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let c_li = variables.get(PLATED_LITHIUM_CONCENTRATION)?;
        Ok(vec![(c_li.clone(), Parameter::new(INITIAL_PLATED_LITHIUM).build())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsbm_core::errors::ErrorKind;
    use rsbm_core::parameters::ParameterValues;
    use rsbm_core::symbol::{Bindings, Value};

    #[test]
    fn test_positive_electrode_is_not_implemented() {
        let err = ReversiblePlating::new(Electrode::Positive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);

        let deserialised = ReversiblePlating {
            electrode: Electrode::Positive,
        };
        assert_eq!(
            deserialised.get_fundamental_variables().unwrap_err().kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn test_no_net_current_at_equilibrium() {
        let plating = ReversiblePlating::new(Electrode::Negative).unwrap();
        let mut variables = plating.get_fundamental_variables().unwrap();
        variables.insert(
            surface_potential_difference(Electrode::Negative),
            Symbol::scalar(0.0),
        );
        variables.insert(
            x_averaged_electrolyte_concentration(Electrode::Negative.electrode_domain()),
            Symbol::scalar(1000.0),
        );
        let coupled = plating.get_coupled_variables(&variables).unwrap();
        let j = coupled.get(PLATING_INTERFACIAL_CURRENT_DENSITY).unwrap();

        // Plated lithium at the electrolyte concentration is in equilibrium at zero overpotential
        let values = ParameterValues::from([
            (RATE_CONSTANT, 1e-9),
            (TRANSFER_COEFFICIENT, 0.5),
            ("Faraday constant [C.mol-1]", 96485.33212),
            ("Ideal gas constant [J.K-1.mol-1]", 8.314462618),
            ("Reference temperature [K]", 298.15),
        ]);
        let c_li = variables.get(PLATED_LITHIUM_CONCENTRATION).unwrap();
        let state = Bindings::new()
            .with_parameters(&values)
            .bind(c_li, Value::Scalar(1000.0));
        let value = j.evaluate(&state).unwrap().as_scalar().unwrap();
        assert!(value.abs() < 1e-12, "j = {}", value);
    }
}
