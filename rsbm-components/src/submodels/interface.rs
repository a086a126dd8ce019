//! Reaction kinetics at the electrode/electrolyte interface

use super::electrolyte_conductivity::surface_potential_difference;
use super::electrolyte_diffusion::x_averaged_electrolyte_concentration;
use super::particle::{maximum_concentration, particle_surface_concentration};
use super::{electrode_parameter, thermal_voltage};
use log::debug;
use rsbm_core::domain::Electrode;
use rsbm_core::errors::RSBMResult;
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::Symbol;
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub fn interfacial_current_density(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode interfacial current density [A.m-2]",
        electrode.name()
    )
}

pub fn exchange_current_density(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode exchange current density [A.m-2]",
        electrode.name()
    )
}

pub fn open_circuit_potential_name(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode open-circuit potential [V]",
        electrode.name()
    )
}

pub fn reaction_overpotential(electrode: Electrode) -> String {
    format!(
        "X-averaged {} electrode reaction overpotential [V]",
        electrode.name()
    )
}

/// `a tanh(b (x - c))`
fn tanh_term(x: &Symbol, a: f64, b: f64, c: f64) -> RSBMResult<Symbol> {
    x.sub(c)?.mul(b)?.tanh().mul(a)
}

/// Open-circuit potential of the active material as a function of its stoichiometry
///
/// The negative electrode is graphite, the positive electrode a nickel-rich oxide.
pub fn open_circuit_potential(electrode: Electrode, stoichiometry: &Symbol) -> RSBMResult<Symbol> {
    let x = stoichiometry;
    match electrode {
        Electrode::Negative => x
            .mul(-39.3631)?
            .exp()
            .mul(1.9793)?
            .add(0.2482)?
            .sub(&tanh_term(x, 0.0909, 29.8538, 0.1234)?)?
            .sub(&tanh_term(x, 0.04478, 14.9159, 0.2769)?)?
            .sub(&tanh_term(x, 0.0205, 30.4444, 0.6103)?),
        Electrode::Positive => x
            .mul(-0.8090)?
            .add(4.4875)?
            .sub(&tanh_term(x, 0.0428, 18.5138, 0.5542)?)?
            .sub(&tanh_term(x, 17.7326, 15.7890, 0.3117)?)?
            .add(&tanh_term(x, 17.5842, 15.9308, 0.3120)?),
    }
}

/// Symmetric Butler-Volmer kinetics
///
/// $$ j = 2 j_0 \sinh\left(\frac{F \eta}{2 R T}\right), \quad \eta = \Delta\phi - U(c_{s,surf}) $$
///
/// with the exchange current density
/// $$ j_0 = k \sqrt{c_e c_{s,surf} (c_{s,max} - c_{s,surf})} $$
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButlerVolmer {
    pub electrode: Electrode,
}

impl ButlerVolmer {
    pub fn new(electrode: Electrode) -> Self {
        Self { electrode }
    }
}

#[typetag::serde]
impl SubModel for ButlerVolmer {
    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        let electrode = self.electrode;
        let c_surf = variables.get(&particle_surface_concentration(electrode))?;
        let c_e =
            variables.get(&x_averaged_electrolyte_concentration(electrode.electrode_domain()))?;
        let delta_phi = variables.get(&surface_potential_difference(electrode))?;

        let c_max = maximum_concentration(electrode);
        let ocp = open_circuit_potential(electrode, &c_surf.div(&c_max)?)?;
        let eta = delta_phi.sub(&ocp)?;
        let j0 = electrode_parameter(electrode, "electrode reaction rate constant [A.m2.5.mol-1.5]")
            .mul(&c_e.mul(c_surf)?.mul(&c_max.sub(c_surf)?)?.sqrt())?;
        let j = j0
            .mul(2.0)?
            .mul(&eta.div(&thermal_voltage()?.mul(2.0)?)?.sinh())?;
        debug!("Butler-Volmer kinetics resolved in the {} electrode", electrode);

        Ok([
            (open_circuit_potential_name(electrode), ocp),
            (reaction_overpotential(electrode), eta),
            (exchange_current_density(electrode), j0),
            (interfacial_current_density(electrode), j),
        ]
        .into_iter()
        .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use rsbm_core::symbol::Bindings;

    fn ocp_at(electrode: Electrode, x: f64) -> f64 {
        open_circuit_potential(electrode, &Symbol::scalar(x))
            .unwrap()
            .evaluate(&Bindings::new())
            .unwrap()
            .as_scalar()
            .unwrap()
    }

    #[test]
    fn test_open_circuit_potentials() {
        // Graphite sits around 0.1 V at mid stoichiometry
        let negative = ocp_at(Electrode::Negative, 0.5);
        assert!(negative > 0.05 && negative < 0.2, "U_n = {}", negative);
        // The positive electrode falls as it fills
        let full = ocp_at(Electrode::Positive, 0.9);
        let empty = ocp_at(Electrode::Positive, 0.3);
        assert!(empty > full);
        assert!(full > 3.0 && empty < 4.5);
    }

    #[test]
    fn test_open_circuit_potential_is_constant_folded() {
        let folded = open_circuit_potential(Electrode::Negative, &Symbol::scalar(0.5))
            .unwrap()
            .simplify()
            .unwrap();
        assert!(folded.is_constant());
        let value = folded.evaluate(&Bindings::new()).unwrap().as_scalar().unwrap();
        assert!(is_close!(value, ocp_at(Electrode::Negative, 0.5)));
    }
}
