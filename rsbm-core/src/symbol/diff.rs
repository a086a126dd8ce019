//! Symbolic elementwise differentiation

use super::{BinaryOperator, Symbol, SymbolKind};
use crate::errors::{RSBMError, RSBMResult};

fn is_zero(s: &Symbol) -> bool {
    s.is_scalar_constant(0.0)
}

fn is_one(s: &Symbol) -> bool {
    s.is_scalar_constant(1.0)
}

fn add(a: Symbol, b: Symbol) -> RSBMResult<Symbol> {
    if is_zero(&a) {
        Ok(b)
    } else if is_zero(&b) {
        Ok(a)
    } else {
        a.add(&b)
    }
}

fn sub(a: Symbol, b: Symbol) -> RSBMResult<Symbol> {
    if is_zero(&b) {
        Ok(a)
    } else if is_zero(&a) {
        Ok(b.neg())
    } else {
        a.sub(&b)
    }
}

fn mul(a: &Symbol, b: &Symbol) -> RSBMResult<Symbol> {
    if is_zero(a) || is_zero(b) {
        Ok(Symbol::scalar(0.0))
    } else if is_one(a) {
        Ok(b.clone())
    } else if is_one(b) {
        Ok(a.clone())
    } else {
        a.mul(b)
    }
}

impl Symbol {
    /// Partial derivative of the expression with respect to `variable`
    ///
    /// The derivative is taken elementwise and carries the domain of `self`.
    /// Spatial operators and matrix products cannot be differentiated this way.
    ///
    /// ```rust
    /// use rsbm_core::symbol::{Bindings, Symbol, Value};
    /// use rsbm_core::domain::DomainSet;
    ///
    /// let x = Symbol::variable("x", DomainSet::empty());
    /// let f = x.pow(3.0).unwrap();
    /// let df = f.diff(&x).unwrap();
    /// let value = df.evaluate(&Bindings::new().bind(&x, Value::Scalar(2.0))).unwrap();
    /// assert_eq!(value, Value::Scalar(12.0));
    /// ```
    pub fn diff(&self, variable: &Symbol) -> RSBMResult<Symbol> {
        let derivative = self.diff_inner(variable)?;
        if derivative.domain().is_empty() && !self.domain().is_empty() {
            derivative.broadcast(self.domain().clone())
        } else {
            Ok(derivative)
        }
    }

    fn diff_inner(&self, variable: &Symbol) -> RSBMResult<Symbol> {
        if self == variable {
            return Ok(Symbol::scalar(1.0));
        }
        if !self.has_symbol(variable) {
            return Ok(Symbol::scalar(0.0));
        }
        match self.kind() {
            SymbolKind::Unary { op, child } => {
                let inner = child.diff_inner(variable)?;
                mul(&op.derivative(child)?, &inner)
            }
            SymbolKind::Binary { op, left, right } => {
                let dl = left.diff_inner(variable)?;
                let dr = right.diff_inner(variable)?;
                match op {
                    BinaryOperator::Add => add(dl, dr),
                    BinaryOperator::Subtract => sub(dl, dr),
                    BinaryOperator::Multiply => add(mul(&dl, right)?, mul(left, &dr)?),
                    BinaryOperator::Divide => {
                        let numerator = sub(mul(&dl, right)?, mul(left, &dr)?)?;
                        numerator.div(&right.pow(2.0)?)
                    }
                    BinaryOperator::Power => {
                        if is_zero(&dr) {
                            // d(l^r) = r l^(r-1) dl
                            let factor = right.mul(&left.pow(&right.sub(1.0)?)?)?;
                            mul(&factor, &dl)
                        } else {
                            // d(l^r) = l^r (dr ln l + r dl / l)
                            let log_term = mul(&dr, &left.log())?;
                            let power_term = mul(right, &dl)?.div(left)?;
                            self.mul(&add(log_term, power_term)?)
                        }
                    }
                }
            }
            SymbolKind::Broadcast(child) => {
                let inner = child.diff_inner(variable)?;
                inner.broadcast(self.domain().clone())
            }
            SymbolKind::DomainConcatenation(children) => {
                let parts = children
                    .iter()
                    .map(|child| child.diff(variable))
                    .collect::<RSBMResult<Vec<_>>>()?;
                Symbol::concatenate(&parts)
            }
            SymbolKind::NumericConcatenation(children) => {
                let parts = children
                    .iter()
                    .map(|child| child.diff(variable))
                    .collect::<RSBMResult<Vec<_>>>()?;
                Ok(Symbol::numeric_concatenation(parts, self.domain().clone()))
            }
            _ => Err(RSBMError::NotImplemented(format!(
                "cannot differentiate '{}' with respect to '{}'",
                self,
                variable.name()
            ))),
        }
    }
}
