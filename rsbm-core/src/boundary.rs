//! Boundary conditions at the two ends of a one-dimensional domain

use crate::errors::{RSBMError, RSBMResult};
use crate::symbol::{Side, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryConditionType {
    /// The value of the expression is prescribed
    Dirichlet,
    /// The gradient of the expression along the coordinate is prescribed
    Neumann,
}

impl fmt::Display for BoundaryConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryConditionType::Dirichlet => write!(f, "Dirichlet"),
            BoundaryConditionType::Neumann => write!(f, "Neumann"),
        }
    }
}

/// A condition on one side of a domain
///
/// The value must be domain-free; the well-posedness check rejects any other value.
#[derive(Debug, Clone)]
pub struct BoundaryCondition {
    pub value: Symbol,
    pub kind: BoundaryConditionType,
}

impl BoundaryCondition {
    pub fn dirichlet(value: impl Into<Symbol>) -> Self {
        Self {
            value: value.into(),
            kind: BoundaryConditionType::Dirichlet,
        }
    }

    pub fn neumann(value: impl Into<Symbol>) -> Self {
        Self {
            value: value.into(),
            kind: BoundaryConditionType::Neumann,
        }
    }
}

/// The conditions registered for one expression
#[derive(Debug, Clone, Default)]
pub struct BoundaryConditions {
    pub left: Option<BoundaryCondition>,
    pub right: Option<BoundaryCondition>,
}

impl BoundaryConditions {
    pub fn new(left: BoundaryCondition, right: BoundaryCondition) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    /// Zero-flux conditions at both ends
    pub fn zero_flux() -> Self {
        Self::new(
            BoundaryCondition::neumann(0.0),
            BoundaryCondition::neumann(0.0),
        )
    }

    pub fn side(&self, side: Side) -> Option<&BoundaryCondition> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Combine conditions registered separately for the two sides
    ///
    /// Registering the same side twice is an error.
    pub fn merge(&mut self, other: BoundaryConditions, expression: &Symbol) -> RSBMResult<()> {
        for (side, incoming) in [(Side::Left, other.left), (Side::Right, other.right)] {
            let Some(incoming) = incoming else {
                continue;
            };
            let slot = match side {
                Side::Left => &mut self.left,
                Side::Right => &mut self.right,
            };
            if slot.is_some() {
                return Err(RSBMError::Model(format!(
                    "boundary condition for '{}' on the {} side is set twice",
                    expression, side
                )));
            }
            *slot = Some(incoming);
        }
        Ok(())
    }

    /// Map both values through `f`
    pub(crate) fn try_map(
        &self,
        mut f: impl FnMut(&Symbol) -> RSBMResult<Symbol>,
    ) -> RSBMResult<BoundaryConditions> {
        let mut map = |bc: &Option<BoundaryCondition>| -> RSBMResult<Option<BoundaryCondition>> {
            bc.as_ref()
                .map(|bc| {
                    Ok(BoundaryCondition {
                        value: f(&bc.value)?,
                        kind: bc.kind,
                    })
                })
                .transpose()
        };
        Ok(BoundaryConditions {
            left: map(&self.left)?,
            right: map(&self.right)?,
        })
    }
}
