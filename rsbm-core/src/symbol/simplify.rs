//! Semantics-preserving simplification

use super::{BinaryOperator, Bindings, Symbol, SymbolId, SymbolKind, UnaryOperator, Value};
use crate::errors::RSBMResult;
use std::collections::HashMap;

/// Whether the node is a domain-free literal
fn as_constant(s: &Symbol) -> Option<f64> {
    match s.kind() {
        SymbolKind::Scalar(x) if s.domain().is_empty() => Some(*x),
        _ => None,
    }
}

/// Collect the operands of a chain of `op`
fn flatten(symbol: &Symbol, op: BinaryOperator, terms: &mut Vec<Symbol>) {
    match symbol.kind() {
        SymbolKind::Binary {
            op: inner,
            left,
            right,
        } if *inner == op => {
            flatten(left, op, terms);
            flatten(right, op, terms);
        }
        _ => terms.push(symbol.clone()),
    }
}

impl Symbol {
    /// Simplify the expression
    ///
    /// Constant subtrees are folded, sums and products are flattened with their literal
    /// constants combined, and the identities `x + 0`, `x - 0`, `0 - x`, `x * 1`, `x / 1`
    /// and `x ** 1` are removed. `x * 0` is kept, since `x` may not be finite.
    pub fn simplify(&self) -> RSBMResult<Symbol> {
        let mut cache = HashMap::new();
        self.simplify_cached(&mut cache)
    }

    fn simplify_cached(&self, cache: &mut HashMap<SymbolId, Symbol>) -> RSBMResult<Symbol> {
        if let Some(done) = cache.get(&self.id()) {
            return Ok(done.clone());
        }
        let children = self.children();
        let result = if children.is_empty() {
            self.clone()
        } else {
            let mut new_children = Vec::with_capacity(children.len());
            for child in &children {
                new_children.push(child.simplify_cached(cache)?);
            }
            let unchanged = new_children.iter().zip(&children).all(|(a, b)| a == *b);
            let rebuilt = if unchanged {
                self.clone()
            } else {
                self.with_children(new_children)
            };
            rebuilt.simplify_node()?
        };
        cache.insert(self.id(), result.clone());
        Ok(result)
    }

    /// Simplify a node whose children are already simplified
    fn simplify_node(&self) -> RSBMResult<Symbol> {
        if let Some(folded) = self.fold_constant() {
            return Ok(folded);
        }
        let SymbolKind::Binary { op, left, right } = self.kind() else {
            return Ok(self.clone());
        };
        // Identities only apply when they cannot change the domain of the result
        let keeps_domain = |s: &Symbol| s.domain() == self.domain();
        let zero = |s: &Symbol| s.is_scalar_constant(0.0);
        let one = |s: &Symbol| s.is_scalar_constant(1.0);
        match op {
            BinaryOperator::Add if zero(right) && keeps_domain(left) => return Ok(left.clone()),
            BinaryOperator::Add if zero(left) && keeps_domain(right) => return Ok(right.clone()),
            BinaryOperator::Subtract if zero(right) && keeps_domain(left) => {
                return Ok(left.clone())
            }
            BinaryOperator::Subtract if zero(left) && keeps_domain(right) => {
                return Ok(Symbol::unary(UnaryOperator::Negate, right))
            }
            BinaryOperator::Multiply if one(right) && keeps_domain(left) => {
                return Ok(left.clone())
            }
            BinaryOperator::Multiply if one(left) && keeps_domain(right) => {
                return Ok(right.clone())
            }
            BinaryOperator::Divide | BinaryOperator::Power
                if one(right) && keeps_domain(left) =>
            {
                return Ok(left.clone())
            }
            _ => {}
        }
        if op.is_associative() {
            return self.combine_chain(*op);
        }
        Ok(self.clone())
    }

    /// Replace a subtree without symbolic leaves by its value
    fn fold_constant(&self) -> Option<Symbol> {
        if matches!(self.kind(), SymbolKind::Scalar(_) | SymbolKind::Vector(_)) {
            return None;
        }
        if !self.is_constant() {
            return None;
        }
        let kind = match self.evaluate(&Bindings::new()).ok()? {
            Value::Scalar(x) => SymbolKind::Scalar(x),
            Value::Vector(v) => SymbolKind::Vector(std::sync::Arc::new(v)),
        };
        Some(Symbol::from_parts(
            kind,
            self.domain().clone(),
            self.family().cloned(),
            None,
        ))
    }

    /// Flatten a sum or product and merge its literal constants
    fn combine_chain(&self, op: BinaryOperator) -> RSBMResult<Symbol> {
        let mut terms = vec![];
        flatten(self, op, &mut terms);
        let (constants, mut others): (Vec<Symbol>, Vec<Symbol>) =
            terms.into_iter().partition(|t| as_constant(t).is_some());
        if constants.len() < 2 && !(constants.len() == 1 && others.len() > 1) {
            return Ok(self.clone());
        }
        let identity = match op {
            BinaryOperator::Multiply => 1.0,
            _ => 0.0,
        };
        let combined = constants
            .iter()
            .filter_map(as_constant)
            .fold(identity, |acc, x| op.apply(acc, x));

        if others.is_empty() {
            return Ok(Symbol::scalar(combined));
        }
        let mut result = others.remove(0);
        for term in &others {
            result = Symbol::binary(op, &result, term)?;
        }
        if combined != identity || result.domain() != self.domain() {
            result = Symbol::binary(op, &result, &Symbol::scalar(combined))?;
        }
        Ok(result)
    }
}
