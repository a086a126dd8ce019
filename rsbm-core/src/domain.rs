//! Spatial domains that expressions and equations are defined over
//!
//! Domains form a closed set. Behaviour that depends on the domain is selected by
//! matching on [`Domain`] (or [`Electrode`]) rather than by comparing names, so an
//! unsupported combination is caught where the match is written.
//!
//! The declaration order of [`Domain`] is the canonical order used when domains are
//! concatenated: the negative electrode comes before the separator, which comes before the
//! positive electrode.
//!
//! ```rust
//! use rsbm_core::domain::{Domain, DomainSet};
//!
//! let cell = DomainSet::whole_cell();
//! assert_eq!(cell.len(), 3);
//! assert!(cell.contains(Domain::Separator));
//! assert!(DomainSet::from(Domain::NegativeElectrode).is_disjoint(&Domain::Separator.into()));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate system a domain is discretised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSystem {
    Cartesian,
    Spherical,
}

/// A named spatial region
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Domain {
    NegativeElectrode,
    Separator,
    PositiveElectrode,
    NegativeParticle,
    PositiveParticle,
    CurrentCollector,
}

impl Domain {
    /// All domains in canonical order
    pub const ALL: [Domain; 6] = [
        Domain::NegativeElectrode,
        Domain::Separator,
        Domain::PositiveElectrode,
        Domain::NegativeParticle,
        Domain::PositiveParticle,
        Domain::CurrentCollector,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::NegativeElectrode => "negative electrode",
            Domain::Separator => "separator",
            Domain::PositiveElectrode => "positive electrode",
            Domain::NegativeParticle => "negative particle",
            Domain::PositiveParticle => "positive particle",
            Domain::CurrentCollector => "current collector",
        }
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        match self {
            Domain::NegativeParticle | Domain::PositiveParticle => CoordinateSystem::Spherical,
            Domain::NegativeElectrode
            | Domain::Separator
            | Domain::PositiveElectrode
            | Domain::CurrentCollector => CoordinateSystem::Cartesian,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the two electrodes of a cell
///
/// Submodels that exist once per electrode hold one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Electrode {
    Negative,
    Positive,
}

impl Electrode {
    /// Lower-case name, as used inside variable names
    pub fn name(&self) -> &'static str {
        match self {
            Electrode::Negative => "negative",
            Electrode::Positive => "positive",
        }
    }

    /// Capitalised name, as used at the start of variable names
    pub fn title(&self) -> &'static str {
        match self {
            Electrode::Negative => "Negative",
            Electrode::Positive => "Positive",
        }
    }

    pub fn electrode_domain(&self) -> Domain {
        match self {
            Electrode::Negative => Domain::NegativeElectrode,
            Electrode::Positive => Domain::PositiveElectrode,
        }
    }

    pub fn particle_domain(&self) -> Domain {
        match self {
            Electrode::Negative => Domain::NegativeParticle,
            Electrode::Positive => Domain::PositiveParticle,
        }
    }
}

impl fmt::Display for Electrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ordered, duplicate-free set of domains
///
/// The empty set means "domain-free", e.g. time or a lumped scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainSet(Vec<Domain>);

impl DomainSet {
    /// The domain-free set
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Build a set from any collection of domains.
    ///
    /// Domains are sorted into canonical order and duplicates removed.
    pub fn new(domains: impl IntoIterator<Item = Domain>) -> Self {
        let mut domains: Vec<Domain> = domains.into_iter().collect();
        domains.sort();
        domains.dedup();
        Self(domains)
    }

    /// Negative electrode, separator and positive electrode
    pub fn whole_cell() -> Self {
        Self(vec![
            Domain::NegativeElectrode,
            Domain::Separator,
            Domain::PositiveElectrode,
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.0.contains(&domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.0.iter()
    }

    pub fn domains(&self) -> &[Domain] {
        &self.0
    }

    pub fn first(&self) -> Option<Domain> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Domain> {
        self.0.last().copied()
    }

    pub fn is_disjoint(&self, other: &DomainSet) -> bool {
        self.0.iter().all(|d| !other.contains(*d))
    }

    /// Whether every domain of `self` is strictly before every domain of `other`
    pub fn precedes(&self, other: &DomainSet) -> bool {
        match (self.last(), other.first()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    pub fn union(&self, other: &DomainSet) -> DomainSet {
        DomainSet::new(self.0.iter().chain(other.0.iter()).copied())
    }
}

impl From<Domain> for DomainSet {
    fn from(domain: Domain) -> Self {
        Self(vec![domain])
    }
}

impl From<Vec<Domain>> for DomainSet {
    fn from(domains: Vec<Domain>) -> Self {
        Self::new(domains)
    }
}

impl<const N: usize> From<[Domain; N]> for DomainSet {
    fn from(domains: [Domain; N]) -> Self {
        Self::new(domains)
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, domain) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}'", domain)?;
        }
        write!(f, "]")
    }
}
