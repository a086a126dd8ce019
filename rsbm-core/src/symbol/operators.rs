//! Construction of operator nodes
//!
//! Every constructor checks domain compatibility and returns a new node.
//! Operands are shared, never modified.

use super::{Side, Symbol, SymbolKind};
use crate::domain::DomainSet;
use crate::errors::{RSBMError, RSBMResult};

/// Elementwise binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "**",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "subtract",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
            BinaryOperator::Power => "raise to the power",
        }
    }

    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            BinaryOperator::Power => a.powf(b),
        }
    }

    /// Whether `(a op b) op c == a op (b op c)`
    pub fn is_associative(&self) -> bool {
        matches!(self, BinaryOperator::Add | BinaryOperator::Multiply)
    }
}

/// Elementwise unary functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Abs,
    Exp,
    Log,
    Sqrt,
    Sin,
    Cos,
    Tanh,
    Sinh,
    Cosh,
    Arcsinh,
}

impl UnaryOperator {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "negate",
            UnaryOperator::Abs => "abs",
            UnaryOperator::Exp => "exp",
            UnaryOperator::Log => "log",
            UnaryOperator::Sqrt => "sqrt",
            UnaryOperator::Sin => "sin",
            UnaryOperator::Cos => "cos",
            UnaryOperator::Tanh => "tanh",
            UnaryOperator::Sinh => "sinh",
            UnaryOperator::Cosh => "cosh",
            UnaryOperator::Arcsinh => "arcsinh",
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -x,
            UnaryOperator::Abs => x.abs(),
            UnaryOperator::Exp => x.exp(),
            UnaryOperator::Log => x.ln(),
            UnaryOperator::Sqrt => x.sqrt(),
            UnaryOperator::Sin => x.sin(),
            UnaryOperator::Cos => x.cos(),
            UnaryOperator::Tanh => x.tanh(),
            UnaryOperator::Sinh => x.sinh(),
            UnaryOperator::Cosh => x.cosh(),
            UnaryOperator::Arcsinh => x.asinh(),
        }
    }

    /// Numerical derivative `f'(x)`
    pub fn derivative_value(&self, x: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -1.0,
            UnaryOperator::Abs if x == 0.0 => 0.0,
            UnaryOperator::Abs => x.signum(),
            UnaryOperator::Exp => x.exp(),
            UnaryOperator::Log => 1.0 / x,
            UnaryOperator::Sqrt => 0.5 / x.sqrt(),
            UnaryOperator::Sin => x.cos(),
            UnaryOperator::Cos => -x.sin(),
            UnaryOperator::Tanh => 1.0 - x.tanh().powi(2),
            UnaryOperator::Sinh => x.cosh(),
            UnaryOperator::Cosh => x.sinh(),
            UnaryOperator::Arcsinh => 1.0 / (x * x + 1.0).sqrt(),
        }
    }

    /// Symbolic derivative `f'(child)`
    pub(crate) fn derivative(&self, child: &Symbol) -> RSBMResult<Symbol> {
        match self {
            UnaryOperator::Negate => Ok(Symbol::scalar(-1.0)),
            UnaryOperator::Abs => child.div(&child.abs()),
            UnaryOperator::Exp => Ok(child.exp()),
            UnaryOperator::Log => Symbol::scalar(1.0).div(child),
            UnaryOperator::Sqrt => Symbol::scalar(0.5).div(&child.sqrt()),
            UnaryOperator::Sin => Ok(child.cos()),
            UnaryOperator::Cos => Ok(child.sin().neg()),
            UnaryOperator::Tanh => Symbol::scalar(1.0).sub(&child.tanh().pow(2.0)?),
            UnaryOperator::Sinh => Ok(child.cosh()),
            UnaryOperator::Cosh => Ok(child.sinh()),
            UnaryOperator::Arcsinh => {
                Symbol::scalar(1.0).div(&child.pow(2.0)?.add(1.0)?.sqrt())
            }
        }
    }
}

fn combine_domains(op: BinaryOperator, left: &Symbol, right: &Symbol) -> RSBMResult<DomainSet> {
    let (l, r) = (left.domain(), right.domain());
    if l == r || r.is_empty() {
        Ok(l.clone())
    } else if l.is_empty() {
        Ok(r.clone())
    } else {
        Err(RSBMError::DomainMismatch {
            operation: op.name().to_string(),
            left: left.to_string(),
            right: right.to_string(),
            left_domain: l.clone(),
            right_domain: r.clone(),
        })
    }
}

fn require_domain(child: &Symbol, operator: &str) -> RSBMResult<()> {
    if child.domain().is_empty() {
        return Err(RSBMError::InvalidDomain {
            symbol: child.to_string(),
            reason: format!("cannot take {} of a domain-free expression", operator),
        });
    }
    Ok(())
}

impl Symbol {
    /// Combine two expressions with `op`
    ///
    /// Fails with a domain error unless the operands share a domain or one is domain-free.
    /// The family is kept when the operands agree on it (or only one has one).
    pub fn binary(op: BinaryOperator, left: &Symbol, right: &Symbol) -> RSBMResult<Symbol> {
        let domain = combine_domains(op, left, right)?;
        let family = match (left.family(), right.family()) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            _ => None,
        };
        Ok(Symbol::from_parts(
            SymbolKind::Binary {
                op,
                left: left.clone(),
                right: right.clone(),
            },
            domain,
            family,
            None,
        ))
    }

    pub fn add(&self, rhs: impl Into<Symbol>) -> RSBMResult<Symbol> {
        Symbol::binary(BinaryOperator::Add, self, &rhs.into())
    }

    pub fn sub(&self, rhs: impl Into<Symbol>) -> RSBMResult<Symbol> {
        Symbol::binary(BinaryOperator::Subtract, self, &rhs.into())
    }

    pub fn mul(&self, rhs: impl Into<Symbol>) -> RSBMResult<Symbol> {
        Symbol::binary(BinaryOperator::Multiply, self, &rhs.into())
    }

    pub fn div(&self, rhs: impl Into<Symbol>) -> RSBMResult<Symbol> {
        Symbol::binary(BinaryOperator::Divide, self, &rhs.into())
    }

    pub fn pow(&self, exponent: impl Into<Symbol>) -> RSBMResult<Symbol> {
        Symbol::binary(BinaryOperator::Power, self, &exponent.into())
    }

    /// Apply an elementwise function
    pub fn unary(op: UnaryOperator, child: &Symbol) -> Symbol {
        Symbol::from_parts(
            SymbolKind::Unary {
                op,
                child: child.clone(),
            },
            child.domain().clone(),
            child.family().cloned(),
            None,
        )
    }

    pub fn neg(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Negate, self)
    }

    pub fn abs(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Abs, self)
    }

    pub fn exp(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Exp, self)
    }

    pub fn log(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Log, self)
    }

    pub fn sqrt(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Sqrt, self)
    }

    pub fn sin(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Sin, self)
    }

    pub fn cos(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Cos, self)
    }

    pub fn tanh(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Tanh, self)
    }

    pub fn sinh(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Sinh, self)
    }

    pub fn cosh(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Cosh, self)
    }

    pub fn arcsinh(&self) -> Symbol {
        Symbol::unary(UnaryOperator::Arcsinh, self)
    }

    /// Spatial gradient
    pub fn gradient(&self) -> RSBMResult<Symbol> {
        require_domain(self, "the gradient")?;
        Ok(Symbol::from_parts(
            SymbolKind::Gradient(self.clone()),
            self.domain().clone(),
            self.family().cloned(),
            None,
        ))
    }

    /// Spatial divergence
    pub fn divergence(&self) -> RSBMResult<Symbol> {
        require_domain(self, "the divergence")?;
        Ok(Symbol::from_parts(
            SymbolKind::Divergence(self.clone()),
            self.domain().clone(),
            self.family().cloned(),
            None,
        ))
    }

    /// Definite integral over the whole domain of the expression
    ///
    /// The result is domain-free.
    pub fn integral(&self) -> RSBMResult<Symbol> {
        require_domain(self, "the integral")?;
        Ok(Symbol::from_parts(
            SymbolKind::Integral(self.clone()),
            DomainSet::empty(),
            self.family().cloned(),
            None,
        ))
    }

    /// Value of the expression at one end of its domain
    pub fn boundary_value(&self, side: Side) -> RSBMResult<Symbol> {
        require_domain(self, "the boundary value")?;
        Ok(Symbol::from_parts(
            SymbolKind::BoundaryValue {
                child: self.clone(),
                side,
            },
            DomainSet::empty(),
            self.family().cloned(),
            None,
        ))
    }

    /// Broadcast a domain-free expression onto `domain`
    ///
    /// Broadcasting an expression onto its own domain returns it unchanged.
    pub fn broadcast(&self, domain: impl Into<DomainSet>) -> RSBMResult<Symbol> {
        let domain = domain.into();
        if domain.is_empty() {
            return Err(RSBMError::InvalidDomain {
                symbol: self.to_string(),
                reason: "cannot broadcast onto an empty domain".to_string(),
            });
        }
        if self.domain() == &domain {
            return Ok(self.clone());
        }
        if !self.domain().is_empty() {
            return Err(RSBMError::InvalidDomain {
                symbol: self.to_string(),
                reason: format!(
                    "cannot broadcast from {} onto {}",
                    self.domain(),
                    domain
                ),
            });
        }
        Ok(Symbol::from_parts(
            SymbolKind::Broadcast(self.clone()),
            domain,
            self.family().cloned(),
            None,
        ))
    }

    /// Join expressions defined on adjacent domains
    ///
    /// Children must have non-empty, pairwise disjoint domains given in canonical order.
    /// A single child is returned unchanged.
    pub fn concatenate(children: &[Symbol]) -> RSBMResult<Symbol> {
        let Some(first) = children.first() else {
            return Err(RSBMError::InvalidDomain {
                symbol: "concatenation".to_string(),
                reason: "cannot concatenate zero expressions".to_string(),
            });
        };
        for child in children {
            require_domain(child, "a concatenation")?;
        }
        for pair in children.windows(2) {
            if !pair[0].domain().precedes(pair[1].domain()) {
                return Err(RSBMError::DomainMismatch {
                    operation: "concatenate".to_string(),
                    left: pair[0].to_string(),
                    right: pair[1].to_string(),
                    left_domain: pair[0].domain().clone(),
                    right_domain: pair[1].domain().clone(),
                });
            }
        }
        if children.len() == 1 {
            return Ok(first.clone());
        }
        let domain = children
            .iter()
            .fold(DomainSet::empty(), |acc, c| acc.union(c.domain()));
        Ok(Symbol::from_kind(
            SymbolKind::DomainConcatenation(children.to_vec()),
            domain,
        ))
    }
}

/// Average of an expression over its domain
///
/// Domain-free expressions are returned unchanged.
pub fn x_average(symbol: &Symbol) -> RSBMResult<Symbol> {
    if symbol.domain().is_empty() {
        return Ok(symbol.clone());
    }
    let length = Symbol::scalar(1.0).broadcast(symbol.domain().clone())?.integral()?;
    symbol.integral()?.div(&length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::errors::ErrorKind;
    use crate::symbol::Variable;

    #[test]
    fn add_disjoint_domains_fails() {
        let a = Symbol::variable("a", Domain::NegativeElectrode);
        let b = Symbol::variable("b", Domain::PositiveElectrode);
        let err = a.add(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        let message = err.to_string();
        assert!(message.contains("'a'"));
        assert!(message.contains("positive electrode"));
    }

    #[test]
    fn abs_has_zero_slope_at_origin() {
        assert_eq!(UnaryOperator::Abs.derivative_value(0.0), 0.0);
        assert_eq!(UnaryOperator::Abs.derivative_value(-0.0), 0.0);
        assert_eq!(UnaryOperator::Abs.derivative_value(-2.0), -1.0);
        assert_eq!(UnaryOperator::Abs.derivative_value(3.0), 1.0);
    }

    #[test]
    fn domain_free_operand_adopts_other_domain() {
        let a = Symbol::variable("a", Domain::NegativeElectrode);
        let sum = Symbol::parameter("k").add(&a).unwrap();
        assert_eq!(sum.domain(), a.domain());
        let sum = a.add(2.0).unwrap();
        assert_eq!(sum.domain(), a.domain());
    }

    #[test]
    fn family_survives_composition() {
        let a = Variable::new("a").family("small").build();
        let expr = a.exp().mul(3.0).unwrap();
        assert_eq!(expr.family().unwrap().name(), "small");

        let b = Variable::new("b").family("large").build();
        assert!(a.add(&b).unwrap().family().is_none());
    }

    #[test]
    fn gradient_requires_domain() {
        let a = Symbol::variable("a", DomainSet::empty());
        assert_eq!(a.gradient().unwrap_err().kind(), ErrorKind::Domain);
        let c = Symbol::variable("c", Domain::Separator);
        assert_eq!(c.gradient().unwrap().domain(), c.domain());
        assert!(c.integral().unwrap().domain().is_empty());
        assert!(c.boundary_value(Side::Left).unwrap().domain().is_empty());
    }

    #[test]
    fn concatenation_rules() {
        let n = Symbol::variable("c_n", Domain::NegativeElectrode);
        let s = Symbol::variable("c_s", Domain::Separator);
        let p = Symbol::variable("c_p", Domain::PositiveElectrode);

        let c = Symbol::concatenate(&[n.clone(), s.clone(), p.clone()]).unwrap();
        assert_eq!(c.domain(), &DomainSet::whole_cell());

        // Out of order
        let err = Symbol::concatenate(&[s.clone(), n.clone()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        // Overlapping
        let n2 = Symbol::variable("c_n2", Domain::NegativeElectrode);
        assert!(Symbol::concatenate(&[n.clone(), n2]).is_err());

        // Domain-free children
        let k = Symbol::parameter("k");
        assert!(Symbol::concatenate(&[k, p]).is_err());
    }

    #[test]
    fn broadcast_rules() {
        let k = Symbol::parameter("k");
        let b = k.broadcast(Domain::Separator).unwrap();
        assert_eq!(b.domain(), &DomainSet::from(Domain::Separator));
        // Onto own domain is a no-op
        assert_eq!(b.broadcast(Domain::Separator).unwrap(), b);
        // Between different domains is not allowed
        assert!(b.broadcast(Domain::NegativeElectrode).is_err());
    }

    #[test]
    fn x_average_is_domain_free() {
        let c = Symbol::variable("c", Domain::NegativeElectrode);
        let avg = x_average(&c).unwrap();
        assert!(avg.domain().is_empty());
        let k = Symbol::parameter("k");
        assert_eq!(x_average(&k).unwrap(), k);
    }
}
