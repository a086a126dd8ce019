//! External circuit
//!
//! The external circuit sets the current drawn from the cell. With [`CurrentControl`] the
//! current is a parameter. With [`FunctionControl`] it is an unknown determined by an
//! algebraic equation, which holds the voltage or the power at a prescribed value.
//!
//! Both track the discharge capacity, `dQ/dt = I / 3600`.

use crate::options::OperatingMode;
use rsbm_core::domain::DomainSet;
use rsbm_core::errors::RSBMResult;
use rsbm_core::submodel::SubModel;
use rsbm_core::symbol::{Parameter, Symbol, Variable};
use rsbm_core::variables::Variables;
use serde::{Deserialize, Serialize};

pub const CURRENT: &str = "Current [A]";
pub const CURRENT_DENSITY: &str = "Current density [A.m-2]";
pub const DISCHARGE_CAPACITY: &str = "Discharge capacity [A.h]";
pub const TERMINAL_VOLTAGE: &str = "Terminal voltage [V]";
pub const POWER: &str = "Power [W]";

const CURRENT_FUNCTION: &str = "Current function [A]";
const VOLTAGE_FUNCTION: &str = "Voltage function [V]";
const POWER_FUNCTION: &str = "Power function [W]";
const ELECTRODE_AREA: &str = "Electrode area [m2]";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Variables shared by both kinds of control
fn circuit_variables(current: Symbol) -> RSBMResult<Variables> {
    let current_density = current.div(&Parameter::new(ELECTRODE_AREA).build())?;
    let capacity = Symbol::variable(DISCHARGE_CAPACITY, DomainSet::empty());
    Ok([
        (CURRENT, current),
        (CURRENT_DENSITY, current_density),
        (DISCHARGE_CAPACITY, capacity),
    ]
    .into_iter()
    .collect())
}

fn power(variables: &Variables) -> RSBMResult<Variables> {
    let current = variables.get(CURRENT)?;
    let voltage = variables.get(TERMINAL_VOLTAGE)?;
    Ok([(POWER, current.mul(voltage)?)].into_iter().collect())
}

fn discharge_capacity_rhs(variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
    let capacity = variables.get(DISCHARGE_CAPACITY)?;
    let current = variables.get(CURRENT)?;
    Ok(vec![(capacity.clone(), current.div(SECONDS_PER_HOUR)?)])
}

/// The applied current is the parameter "Current function [A]"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentControl;

#[typetag::serde]
impl SubModel for CurrentControl {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        circuit_variables(Parameter::new(CURRENT_FUNCTION).build())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        power(variables)
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        discharge_capacity_rhs(variables)
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let capacity = variables.get(DISCHARGE_CAPACITY)?;
        Ok(vec![(capacity.clone(), Symbol::scalar(0.0))])
    }
}

/// The quantity a [`FunctionControl`] holds fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlFunction {
    /// `V - V_applied = 0`
    Voltage,
    /// `I V - P_applied = 0`
    Power,
}

impl ControlFunction {
    /// The control function for an operating mode, or `None` when the current is prescribed
    pub fn from_operating_mode(mode: OperatingMode) -> Option<Self> {
        match mode {
            OperatingMode::Current => None,
            OperatingMode::Voltage => Some(ControlFunction::Voltage),
            OperatingMode::Power => Some(ControlFunction::Power),
        }
    }
}

/// The current is an unknown, determined by holding a function of the cell state fixed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionControl {
    pub control: ControlFunction,
}

impl FunctionControl {
    pub fn new(control: ControlFunction) -> Self {
        Self { control }
    }
}

#[typetag::serde]
impl SubModel for FunctionControl {
    fn get_fundamental_variables(&self) -> RSBMResult<Variables> {
        circuit_variables(Variable::new(CURRENT).build())
    }

    fn get_coupled_variables(&self, variables: &Variables) -> RSBMResult<Variables> {
        power(variables)
    }

    fn set_rhs(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        discharge_capacity_rhs(variables)
    }

    fn set_algebraic(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let current = variables.get(CURRENT)?;
        let residual = match self.control {
            ControlFunction::Voltage => variables
                .get(TERMINAL_VOLTAGE)?
                .sub(&Parameter::new(VOLTAGE_FUNCTION).build())?,
            ControlFunction::Power => variables
                .get(POWER)?
                .sub(&Parameter::new(POWER_FUNCTION).build())?,
        };
        Ok(vec![(current.clone(), residual)])
    }

    fn set_initial_conditions(&self, variables: &Variables) -> RSBMResult<Vec<(Symbol, Symbol)>> {
        let capacity = variables.get(DISCHARGE_CAPACITY)?;
        let current = variables.get(CURRENT)?;
        Ok(vec![
            (capacity.clone(), Symbol::scalar(0.0)),
            (current.clone(), Parameter::new(CURRENT_FUNCTION).build()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsbm_core::model::{ModelBuilder, SolverKind};
    use rsbm_core::symbol::SymbolKind;
    use std::sync::Arc;

    /// Stands in for the rest of the cell: a voltage that relaxes to 4 V
    fn with_voltage(builder: &mut ModelBuilder) -> &mut ModelBuilder {
        let voltage = Symbol::variable("v", DomainSet::empty());
        builder
            .with_rhs(&voltage, &Symbol::scalar(4.0).sub(&voltage).unwrap())
            .with_initial_condition(&voltage, 3.0)
            .with_variable(TERMINAL_VOLTAGE, &voltage)
    }

    #[test]
    fn test_current_control() {
        let mut builder = ModelBuilder::new();
        with_voltage(&mut builder).with_submodel(Arc::new(CurrentControl));
        let model = builder.build().unwrap();
        model.check_well_posedness().unwrap();
        assert_eq!(model.default_solver(), SolverKind::Ode);
        assert!(matches!(
            model.get_variable(CURRENT).unwrap().kind(),
            SymbolKind::Parameter { .. }
        ));
        assert!(model.variables().contains(POWER));
    }

    #[test]
    fn test_function_control() {
        for control in [ControlFunction::Voltage, ControlFunction::Power] {
            let mut builder = ModelBuilder::new();
            with_voltage(&mut builder).with_submodel(Arc::new(FunctionControl::new(control)));
            let model = builder.build().unwrap();
            model.check_well_posedness().unwrap();
            assert_eq!(model.default_solver(), SolverKind::Dae);
            assert_eq!(model.algebraic().len(), 1);
            assert!(model.get_variable(CURRENT).unwrap().is_variable());
        }
    }

    #[test]
    fn test_control_from_operating_mode() {
        assert_eq!(ControlFunction::from_operating_mode(OperatingMode::Current), None);
        assert_eq!(
            ControlFunction::from_operating_mode(OperatingMode::Power),
            Some(ControlFunction::Power)
        );
    }
}
