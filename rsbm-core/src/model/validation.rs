//! Well-posedness checks.
//!
//! A model is well posed when:
//!
//! * (a) no variable is governed by more than one equation,
//! * (b) every governed variable has exactly one initial condition, and every initial
//!   condition belongs to a governed variable,
//! * (c) every expression whose gradient appears in an equation has boundary conditions at
//!   both ends of its domain, unless that domain is periodic,
//! * (d) the right-hand side and the initial condition of every equation are defined on the
//!   domain of its variable (or are domain-free),
//! * (e) every variable referenced anywhere in the model is governed by an equation.
//!
//! Each violation is reported as a [`RSBMError::NotWellPosed`] naming the variable and clause.
//! Boundary-condition values must also be domain-free; a value defined on a domain is
//! reported as [`RSBMError::InvalidDomain`] naming the expression it constrains.

use crate::errors::{RSBMError, RSBMResult, WellPosednessClause};
use crate::symbol::{Side, Symbol, SymbolKind};
use std::collections::HashSet;

use super::assembled::Model;
use super::types::state_variables;

pub(crate) fn check_well_posedness(model: &Model) -> RSBMResult<()> {
    check_unique_equations(model)?;
    check_initial_conditions(model)?;
    check_boundary_conditions(model)?;
    check_boundary_values(model)?;
    check_domains(model)?;
    check_undetermined_variables(model)?;
    Ok(())
}

/// The variables governed by the equations of `model`
fn governed(model: &Model) -> RSBMResult<HashSet<Symbol>> {
    let mut governed = HashSet::new();
    for (key, _) in model.equations() {
        governed.extend(state_variables(key)?);
    }
    Ok(governed)
}

/// Clause (a)
fn check_unique_equations(model: &Model) -> RSBMResult<()> {
    let mut seen = HashSet::new();
    for (key, _) in model.equations() {
        for variable in state_variables(key)? {
            if !seen.insert(variable.clone()) {
                return Err(RSBMError::not_well_posed(
                    variable.name(),
                    WellPosednessClause::DuplicateEquation,
                    "more than one equation (rhs or algebraic) governs this variable",
                ));
            }
        }
    }
    Ok(())
}

/// Clause (b)
fn check_initial_conditions(model: &Model) -> RSBMResult<()> {
    for (key, _) in model.equations() {
        let count = model
            .initial_conditions()
            .iter()
            .filter(|(k, _)| k == key)
            .count();
        if count != 1 {
            return Err(RSBMError::not_well_posed(
                key.name(),
                WellPosednessClause::InitialConditions,
                format!("expected exactly one initial condition, found {}", count),
            ));
        }
    }
    for (key, _) in model.initial_conditions() {
        if !model.equations().any(|(k, _)| k == key) {
            return Err(RSBMError::not_well_posed(
                key.name(),
                WellPosednessClause::InitialConditions,
                "initial condition given for an expression that no equation governs",
            ));
        }
    }
    Ok(())
}

/// Clause (c)
fn check_boundary_conditions(model: &Model) -> RSBMResult<()> {
    for (key, expression) in model.equations() {
        let gradients = expression.find_all(|s| matches!(s.kind(), SymbolKind::Gradient(_)));
        for gradient in gradients {
            let SymbolKind::Gradient(child) = gradient.kind() else {
                continue;
            };
            if model.is_periodic(child.domain()) {
                continue;
            }
            let complete = model
                .boundary_conditions_for(child)
                .map(|bcs| bcs.is_complete())
                .unwrap_or(false);
            if !complete {
                return Err(RSBMError::not_well_posed(
                    child.name(),
                    WellPosednessClause::BoundaryConditions,
                    format!(
                        "the equation for '{}' takes its gradient, so boundary conditions are needed at both ends of {}",
                        key.name(),
                        child.domain()
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn check_boundary_values(model: &Model) -> RSBMResult<()> {
    for (key, conditions) in model.boundary_conditions() {
        for side in [Side::Left, Side::Right] {
            let Some(condition) = conditions.side(side) else {
                continue;
            };
            if !condition.value.domain().is_empty() {
                return Err(RSBMError::InvalidDomain {
                    symbol: key.name(),
                    reason: format!(
                        "the {} {} boundary condition is defined on {} but must be domain-free",
                        side,
                        condition.kind,
                        condition.value.domain()
                    ),
                });
            }
        }
    }
    Ok(())
}

fn check_domain_of(key: &Symbol, expression: &Symbol, what: &str) -> RSBMResult<()> {
    let domain = expression.domain();
    if !domain.is_empty() && domain != key.domain() {
        return Err(RSBMError::not_well_posed(
            key.name(),
            WellPosednessClause::DomainConsistency,
            format!(
                "variable is defined on {} but its {} is defined on {}",
                key.domain(),
                what,
                domain
            ),
        ));
    }
    Ok(())
}

/// Clause (d)
fn check_domains(model: &Model) -> RSBMResult<()> {
    for (key, expression) in model.rhs() {
        check_domain_of(key, expression, "rhs")?;
    }
    for (key, expression) in model.algebraic() {
        check_domain_of(key, expression, "algebraic equation")?;
    }
    for (key, expression) in model.initial_conditions() {
        check_domain_of(key, expression, "initial condition")?;
    }
    Ok(())
}

/// Clause (e)
fn check_undetermined_variables(model: &Model) -> RSBMResult<()> {
    let governed = governed(model)?;
    let mut expressions: Vec<&Symbol> = vec![];
    for (key, expression) in model.equations().chain(model.initial_conditions()) {
        expressions.push(key);
        expressions.push(expression);
    }
    for (key, bcs) in model.boundary_conditions() {
        expressions.push(key);
        expressions.extend(bcs.left.iter().chain(bcs.right.iter()).map(|bc| &bc.value));
    }
    expressions.extend(model.variables().iter().map(|(_, symbol)| symbol));

    for expression in expressions {
        for variable in expression.variables() {
            if !governed.contains(&variable) {
                return Err(RSBMError::not_well_posed(
                    variable.name(),
                    WellPosednessClause::UndeterminedVariable,
                    "variable appears in the model but no equation governs it",
                ));
            }
        }
    }
    Ok(())
}
