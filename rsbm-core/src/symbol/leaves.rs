//! Leaf nodes carrying names: variables, parameters and spatial coordinates

use super::{Family, Symbol, SymbolKind};
use crate::domain::DomainSet;
use crate::errors::{RSBMError, RSBMResult};

/// Builder for an independent unknown
///
/// ```rust
/// use rsbm_core::domain::Domain;
/// use rsbm_core::symbol::Variable;
///
/// let c = Variable::new("Particle concentration")
///     .domain(Domain::NegativeParticle)
///     .family("small particles")
///     .shape_hint(20)
///     .build();
/// assert_eq!(c.family().unwrap().name(), "small particles");
/// assert_eq!(c.shape_hint(), Some(20));
/// ```
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    domain: DomainSet,
    family: Option<Family>,
    shape_hint: Option<usize>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: DomainSet::empty(),
            family: None,
            shape_hint: None,
        }
    }

    pub fn domain(mut self, domain: impl Into<DomainSet>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn family(mut self, family: impl Into<Family>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Declare the number of mesh points this variable is expected to have
    ///
    /// Discretisation fails if the mesh disagrees.
    pub fn shape_hint(mut self, points: usize) -> Self {
        self.shape_hint = Some(points);
        self
    }

    pub fn build(self) -> Symbol {
        Symbol::from_parts(
            SymbolKind::Variable { name: self.name },
            self.domain,
            self.family,
            self.shape_hint,
        )
    }
}

/// Builder for a named parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    domain: DomainSet,
    family: Option<Family>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: DomainSet::empty(),
            family: None,
        }
    }

    pub fn domain(mut self, domain: impl Into<DomainSet>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn family(mut self, family: impl Into<Family>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn build(self) -> Symbol {
        Symbol::from_parts(
            SymbolKind::Parameter { name: self.name },
            self.domain,
            self.family,
            None,
        )
    }
}

impl Symbol {
    /// An independent unknown on `domain`
    pub fn variable(name: impl Into<String>, domain: impl Into<DomainSet>) -> Symbol {
        Variable::new(name).domain(domain).build()
    }

    /// A domain-free parameter
    pub fn parameter(name: impl Into<String>) -> Symbol {
        Parameter::new(name).build()
    }

    /// The coordinate along `domain`, e.g. `x_n` on the negative electrode
    pub fn spatial_variable(
        name: impl Into<String>,
        domain: impl Into<DomainSet>,
    ) -> RSBMResult<Symbol> {
        let name = name.into();
        let domain = domain.into();
        if domain.is_empty() {
            return Err(RSBMError::InvalidDomain {
                symbol: name,
                reason: "spatial variables must be defined on a domain".to_string(),
            });
        }
        Ok(Symbol::from_kind(SymbolKind::SpatialVariable { name }, domain))
    }
}
