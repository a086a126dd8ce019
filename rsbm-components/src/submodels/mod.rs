//! Submodels of a lithium-ion cell
//!
//! Variable names follow the convention `"<description> [<units>]"`. Names that depend on
//! the electrode are built by the functions of the module that publishes them, so a
//! submodel reading another's output never spells the name out by hand.

pub mod electrolyte_conductivity;
pub mod electrolyte_diffusion;
pub mod external_circuit;
pub mod interface;
pub mod li_plating;
pub mod particle;

use rsbm_core::domain::Electrode;
use rsbm_core::errors::RSBMResult;
use rsbm_core::symbol::{Parameter, Symbol};

pub const FARADAY_CONSTANT: &str = "Faraday constant [C.mol-1]";
pub const GAS_CONSTANT: &str = "Ideal gas constant [J.K-1.mol-1]";
pub const REFERENCE_TEMPERATURE: &str = "Reference temperature [K]";

/// A parameter of one electrode, e.g. `"Negative electrode thickness [m]"`
pub fn electrode_parameter(electrode: Electrode, quantity: &str) -> Symbol {
    Parameter::new(format!("{} {}", electrode.title(), quantity)).build()
}

pub fn faraday_constant() -> Symbol {
    Parameter::new(FARADAY_CONSTANT).build()
}

/// `R T / F`
pub fn thermal_voltage() -> RSBMResult<Symbol> {
    Parameter::new(GAS_CONSTANT)
        .build()
        .mul(&Parameter::new(REFERENCE_TEMPERATURE).build())?
        .div(&faraday_constant())
}

/// Surface area of active material per unit electrode volume, `3 eps_s / R`
pub fn surface_area_to_volume_ratio(electrode: Electrode) -> RSBMResult<Symbol> {
    electrode_parameter(electrode, "electrode active material volume fraction")
        .mul(3.0)?
        .div(&electrode_parameter(electrode, "particle radius [m]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use rsbm_core::parameters::ParameterValues;
    use rsbm_core::symbol::Bindings;

    #[test]
    fn test_surface_area_to_volume_ratio() {
        let a = surface_area_to_volume_ratio(Electrode::Positive).unwrap();
        let values = ParameterValues::from([
            ("Positive electrode active material volume fraction", 0.6),
            ("Positive particle radius [m]", 2e-6),
        ]);
        let value = a
            .evaluate(&Bindings::new().with_parameters(&values))
            .unwrap();
        assert!(is_close!(value.as_scalar().unwrap(), 9e5));
    }
}
