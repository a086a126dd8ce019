use crate::domain::{Domain, DomainSet};
use std::fmt;
use thiserror::Error;

/// The clause of the well-posedness check that a model violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellPosednessClause {
    /// A variable is governed by more than one equation
    DuplicateEquation,
    /// A governed variable has no (or more than one) initial condition,
    /// or an initial condition exists for an ungoverned expression
    InitialConditions,
    /// A gradient is taken without boundary conditions at both ends
    BoundaryConditions,
    /// The domain of an equation does not match the domain of its variable
    DomainConsistency,
    /// A variable appears in the model but is not governed by any equation
    UndeterminedVariable,
}

impl fmt::Display for WellPosednessClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellPosednessClause::DuplicateEquation => write!(f, "(a) duplicate equation"),
            WellPosednessClause::InitialConditions => write!(f, "(b) initial conditions"),
            WellPosednessClause::BoundaryConditions => write!(f, "(c) boundary conditions"),
            WellPosednessClause::DomainConsistency => write!(f, "(d) domain consistency"),
            WellPosednessClause::UndeterminedVariable => write!(f, "(e) undetermined variable"),
        }
    }
}

/// Broad classification of errors.
///
/// Every [`RSBMError`] falls into exactly one of these kinds.
/// None of them are transient: they all point at a problem in how a model was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Incompatible or missing domain in an expression composition or mesh lookup
    Domain,
    /// Well-posedness violations, shape mismatches and other model inconsistencies
    Model,
    /// A requested submodel variant, operator or domain combination has no implementation
    NotImplemented,
}

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RSBMError {
    #[error("DomainError: cannot {operation} '{left}' (domain {left_domain}) and '{right}' (domain {right_domain})")]
    DomainMismatch {
        operation: String,
        left: String,
        right: String,
        left_domain: DomainSet,
        right_domain: DomainSet,
    },
    #[error("DomainError: invalid domain for '{symbol}': {reason}")]
    InvalidDomain { symbol: String, reason: String },
    #[error("DomainError: mesh has no submesh for domain '{domain}'")]
    MeshMissingDomain { domain: Domain },
    #[error("DomainError: submeshes for {domains} are not contiguous ({reason})")]
    NonContiguousMesh { domains: DomainSet, reason: String },
    #[error("ModelError: variable '{variable}' violates clause {clause}: {reason}")]
    NotWellPosed {
        variable: String,
        clause: WellPosednessClause,
        reason: String,
    },
    #[error("ModelError: no spatial method registered for domain '{domain}'")]
    MissingSpatialMethod { domain: Domain },
    #[error("ModelError: shape mismatch for '{symbol}': expected {expected} points, found {found}")]
    ShapeMismatch {
        symbol: String,
        expected: usize,
        found: usize,
    },
    #[error("ModelError: variable '{name}' not found")]
    MissingVariable { name: String },
    #[error("ModelError: no value bound for '{name}'")]
    UnboundSymbol { name: String },
    #[error("ModelError: {0}")]
    Model(String),
    #[error("NotImplementedError: {0}")]
    NotImplemented(String),
}

impl RSBMError {
    /// The broad kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RSBMError::DomainMismatch { .. }
            | RSBMError::InvalidDomain { .. }
            | RSBMError::MeshMissingDomain { .. }
            | RSBMError::NonContiguousMesh { .. } => ErrorKind::Domain,
            RSBMError::NotWellPosed { .. }
            | RSBMError::MissingSpatialMethod { .. }
            | RSBMError::ShapeMismatch { .. }
            | RSBMError::MissingVariable { .. }
            | RSBMError::UnboundSymbol { .. }
            | RSBMError::Model(_) => ErrorKind::Model,
            RSBMError::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    pub(crate) fn not_well_posed(
        variable: impl fmt::Display,
        clause: WellPosednessClause,
        reason: impl Into<String>,
    ) -> Self {
        RSBMError::NotWellPosed {
            variable: variable.to_string(),
            clause,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, RSBMError>`.
pub type RSBMResult<T> = Result<T, RSBMError>;
