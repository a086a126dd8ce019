//! Assembly tests: coupled-variable resolution, ordering, dot output, serialisation.

use crate::boundary::{BoundaryCondition, BoundaryConditions};
use crate::domain::Domain;
use crate::errors::{ErrorKind, RSBMError};
use crate::example_submodels::{Decay, Diffusion, FluxMagnitude, Follower, NeedsUnknown};
use crate::model::{ModelBuilder, SolverKind, S};
use crate::symbol::Symbol;
use std::sync::Arc;

#[test]
fn coupled_variables_are_retried() {
    // FluxMagnitude needs the flux published by Diffusion, which is registered later
    let model = ModelBuilder::new()
        .with_submodel(Arc::new(FluxMagnitude))
        .with_submodel(Arc::new(Diffusion {
            domain: Domain::Separator,
        }))
        .build()
        .unwrap();

    assert!(model.variables().contains("Flux"));
    assert!(model.variables().contains("Flux magnitude"));
    assert_eq!(model.rhs().len(), 1);
    model.check_well_posedness().unwrap();
}

#[test]
fn unresolvable_coupled_variable() {
    let err = ModelBuilder::new()
        .with_submodel(Arc::new(Decay::new("x")))
        .with_submodel(Arc::new(NeedsUnknown))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
    let message = err.to_string();
    assert!(message.contains("NeedsUnknown"));
    assert!(message.contains("Unknown quantity"));
}

#[test]
fn duplicate_fundamental_variable() {
    let err = ModelBuilder::new()
        .with_submodel(Arc::new(Decay::new("x")))
        .with_submodel(Arc::new(Decay::new("x")))
        .build()
        .unwrap_err();
    assert!(matches!(err, RSBMError::Model(_)));
    assert!(err.to_string().contains("'x'"));
}

#[test]
fn equations_keep_registration_order() {
    let model = ModelBuilder::new()
        .with_name("two decays")
        .with_submodel(Arc::new(Decay::new("b")))
        .with_submodel(Arc::new(Decay::new("a")))
        .build()
        .unwrap();
    let names: Vec<String> = model.rhs().iter().map(|(k, _)| k.name()).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(model.name(), "two decays");
}

#[test]
fn solver_kind() {
    let ode = ModelBuilder::new()
        .with_submodel(Arc::new(Decay::new("x")))
        .build()
        .unwrap();
    assert_eq!(ode.default_solver(), SolverKind::Ode);

    let dae = ModelBuilder::new()
        .with_submodel(Arc::new(Decay::new("x")))
        .with_submodel(Arc::new(Follower {
            leader: "x".to_string(),
        }))
        .build()
        .unwrap();
    dae.check_well_posedness().unwrap();
    assert_eq!(dae.default_solver(), SolverKind::Dae);
}

#[test]
fn boundary_conditions_merge_across_registrations() {
    let c = Symbol::variable("c", Domain::Separator);
    let model = ModelBuilder::new()
        .with_rhs(&c, &c.gradient().unwrap().divergence().unwrap())
        .with_initial_condition(&c, 0.0)
        .with_boundary_conditions(
            &c,
            BoundaryConditions {
                left: Some(BoundaryCondition::dirichlet(1.0)),
                right: None,
            },
        )
        .with_boundary_conditions(
            &c,
            BoundaryConditions {
                left: None,
                right: Some(BoundaryCondition::neumann(0.0)),
            },
        )
        .build()
        .unwrap();
    assert_eq!(model.boundary_conditions().len(), 1);
    model.check_well_posedness().unwrap();

    let err = ModelBuilder::new()
        .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
        .with_boundary_conditions(&c, BoundaryConditions::zero_flux())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
}

#[test]
fn equation_keys_must_be_variables() {
    let c = Symbol::variable("c", Domain::Separator);
    let err = ModelBuilder::new()
        .with_rhs(&c.exp(), &c)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("exp(c)"));
}

#[test]
fn dot() {
    let model = ModelBuilder::new()
        .with_submodel(Arc::new(Decay::new("x")))
        .with_submodel(Arc::new(Follower {
            leader: "x".to_string(),
        }))
        .build()
        .unwrap();

    let exp = r#"digraph {
    0 [ label = "x"]
    1 [ label = "z"]
    0 -> 0 [ ]
    1 -> 1 [ ]
    0 -> 1 [ ]
}
"#;

    let res = model.as_dot().unwrap();
    assert_eq!(res, exp);
}

#[test]
fn serialise_submodels() {
    let submodel: S = Arc::new(Diffusion {
        domain: Domain::NegativeElectrode,
    });
    let serialised = serde_json::to_string(&submodel).unwrap();
    assert_eq!(
        serialised,
        r#"{"type":"Diffusion","domain":"NegativeElectrode"}"#
    );
    let deserialised: Box<dyn crate::submodel::SubModel> =
        serde_json::from_str(&serialised).unwrap();
    let variables = deserialised.get_fundamental_variables().unwrap();
    assert!(variables.contains("Concentration"));
}
