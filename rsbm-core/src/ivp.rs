//! Integration of discretised ODE models with `ode_solvers`
//!
//! Only models without algebraic equations can be integrated here, since their mass
//! matrix is the identity and `dy/dt = F(t, y)`. Models needing a DAE solver should be
//! handed to an external integrator through
//! [`DiscretisedModel::residuals`](crate::discretisation::DiscretisedModel::residuals).

use crate::discretisation::DiscretisedModel;
use crate::errors::{RSBMError, RSBMResult};
use crate::symbol::Value;
use log::{error, info};
use nalgebra::DVector;
use ode_solvers::{Rk4, System};

/// Type of the state used by the solvers
pub type State = DVector<f64>;

/// Adapter exposing a discretised model as an `ode_solvers` system
#[derive(Debug, Clone, Copy)]
pub struct OdeSystem<'a> {
    model: &'a DiscretisedModel,
}

impl<'a> OdeSystem<'a> {
    pub fn new(model: &'a DiscretisedModel) -> RSBMResult<Self> {
        if model.is_dae() {
            return Err(RSBMError::Model(format!(
                "model '{}' has algebraic equations and needs a DAE solver",
                model.name()
            )));
        }
        Ok(Self { model })
    }
}

impl System<f64, State> for OdeSystem<'_> {
    fn system(&self, t: f64, y: &State, dy: &mut State) {
        match self.model.rhs_algebraic(t, y) {
            Ok(value) => dy.copy_from(&value),
            Err(err) => {
                error!("could not evaluate '{}' at t = {}: {}", self.model.name(), t, err);
                dy.fill(f64::NAN);
            }
        }
    }
}

/// Solution of an initial value problem
#[derive(Debug, Clone)]
pub struct Trajectory<'a> {
    model: &'a DiscretisedModel,
    times: Vec<f64>,
    states: Vec<State>,
}

impl<'a> Trajectory<'a> {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state at the end of the integration
    pub fn last_state(&self) -> Option<&State> {
        self.states.last()
    }

    /// Evaluate the output variable called `name` at every time
    pub fn evaluate_variable(&self, name: &str) -> RSBMResult<Vec<Value>> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(t, y)| self.model.evaluate_variable(name, *t, y))
            .collect()
    }
}

/// Integrate `model` from `t0` to `t_end` with fixed-step RK4
pub fn integrate_rk4(
    model: &DiscretisedModel,
    t0: f64,
    t_end: f64,
    step_size: f64,
) -> RSBMResult<Trajectory<'_>> {
    let system = OdeSystem::new(model)?;
    let mut solver = Rk4::new(system, t0, model.initial_state().clone(), t_end, step_size);
    let stats = solver
        .integrate()
        .map_err(|err| RSBMError::Model(format!("integration failed: {:?}", err)))?;

    let (times, states) = solver.results().get();
    if let Some((t, _)) = times
        .iter()
        .zip(states)
        .find(|(_, y)| y.iter().any(|v| !v.is_finite()))
    {
        return Err(RSBMError::Model(format!(
            "the state of '{}' is not finite at t = {}",
            model.name(),
            t
        )));
    }
    info!(
        "integrated '{}' from {} to {} with {} evaluations of the right-hand side",
        model.name(),
        t0,
        t_end,
        stats.num_eval
    );
    Ok(Trajectory {
        model,
        times: times.clone(),
        states: states.clone(),
    })
}
