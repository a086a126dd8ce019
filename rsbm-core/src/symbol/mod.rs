//! Symbolic expression graph
//!
//! A [`Symbol`] is a cheap handle (an `Arc`) to an immutable node. Nodes are never mutated
//! after construction; every operation returns a new node whose children are shared with the
//! operands. Subexpressions reused by several parents therefore form a DAG rather than a tree,
//! and rewriting passes (simplification, parameter substitution, discretisation) build a new
//! DAG next to the original one.
//!
//! Identity is by node: two symbols compare equal only if they are the same node.
//! This is what allows a [`Symbol`] holding a variable to be used as the key of an equation.
//!
//! ```rust
//! use rsbm_core::domain::Domain;
//! use rsbm_core::symbol::{Bindings, Symbol, Value};
//!
//! let c = Symbol::variable("c", Domain::NegativeElectrode);
//! let k = Symbol::parameter("k");
//! let rate = k.mul(&c).unwrap();
//! assert_eq!(rate.domain(), c.domain());
//!
//! let t = Symbol::time();
//! let expr = t.mul(2.0).unwrap().add(1.0).unwrap();
//! let value = expr.evaluate(&Bindings::new().at_time(3.0)).unwrap();
//! assert_eq!(value, Value::Scalar(7.0));
//! ```

mod diff;
mod evaluate;
mod jacobian;
mod leaves;
mod operators;
mod simplify;

pub use evaluate::{Bindings, Value};
pub use leaves::{Parameter, Variable};
pub use operators::{x_average, BinaryOperator, UnaryOperator};

use crate::domain::DomainSet;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier of a node
pub type SymbolId = u64;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> SymbolId {
    NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Secondary tag distinguishing otherwise identically-named quantities
///
/// For example, per-particle-size variants of a concentration share a name and domain but
/// belong to different families. Families play no part in domain checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Family(String);

impl Family {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Family {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// End of a one-dimensional domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The different kinds of node
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// Literal constant
    Scalar(f64),
    /// Constant vector, produced by discretisation
    Vector(Arc<DVector<f64>>),
    /// Current time
    Time,
    /// Named parameter, bound to a value at evaluation or substituted beforehand
    Parameter { name: String },
    /// Independent unknown of a model
    Variable { name: String },
    /// Coordinate on the node's domain
    SpatialVariable { name: String },
    /// Slice of the global state vector, produced by discretisation
    StateVector { name: String, slice: Range<usize> },
    Unary {
        op: UnaryOperator,
        child: Symbol,
    },
    Binary {
        op: BinaryOperator,
        left: Symbol,
        right: Symbol,
    },
    Gradient(Symbol),
    Divergence(Symbol),
    /// Definite integral over the whole domain of the child
    Integral(Symbol),
    BoundaryValue {
        child: Symbol,
        side: Side,
    },
    /// Domain-free child broadcast onto the node's domain
    Broadcast(Symbol),
    /// Children defined on adjacent domains, in canonical order
    DomainConcatenation(Vec<Symbol>),
    /// Vertical stacking of discretised children
    NumericConcatenation(Vec<Symbol>),
    /// Discrete linear operator applied to the child
    MatrixMultiplication {
        matrix: Arc<DMatrix<f64>>,
        child: Symbol,
    },
}

#[derive(Debug)]
struct SymbolNode {
    id: SymbolId,
    kind: SymbolKind,
    domain: DomainSet,
    family: Option<Family>,
    shape_hint: Option<usize>,
}

/// Handle to an immutable node of the expression graph
#[derive(Clone)]
pub struct Symbol(Arc<SymbolNode>);

impl Symbol {
    pub(crate) fn from_parts(
        kind: SymbolKind,
        domain: DomainSet,
        family: Option<Family>,
        shape_hint: Option<usize>,
    ) -> Self {
        Symbol(Arc::new(SymbolNode {
            id: next_id(),
            kind,
            domain,
            family,
            shape_hint,
        }))
    }

    pub(crate) fn from_kind(kind: SymbolKind, domain: DomainSet) -> Self {
        Self::from_parts(kind, domain, None, None)
    }

    /// A literal constant
    pub fn scalar(value: f64) -> Self {
        Self::from_kind(SymbolKind::Scalar(value), DomainSet::empty())
    }

    /// A constant vector defined on `domain`
    pub fn vector(values: DVector<f64>, domain: impl Into<DomainSet>) -> Self {
        Self::from_kind(SymbolKind::Vector(Arc::new(values)), domain.into())
    }

    /// The current time
    pub fn time() -> Self {
        Self::from_kind(SymbolKind::Time, DomainSet::empty())
    }

    /// A slice of the global state vector
    ///
    /// These are normally produced by discretisation, but are useful when writing
    /// spatial methods or testing the evaluation of discrete systems directly.
    pub fn state_vector(
        name: impl Into<String>,
        slice: Range<usize>,
        domain: impl Into<DomainSet>,
        family: Option<Family>,
    ) -> Self {
        let size = slice.len();
        Self::from_parts(
            SymbolKind::StateVector {
                name: name.into(),
                slice,
            },
            domain.into(),
            family,
            Some(size),
        )
    }

    /// Apply a discrete linear operator to `child`
    pub fn matrix_multiplication(
        matrix: DMatrix<f64>,
        child: &Symbol,
        domain: impl Into<DomainSet>,
    ) -> Self {
        Self::from_kind(
            SymbolKind::MatrixMultiplication {
                matrix: Arc::new(matrix),
                child: child.clone(),
            },
            domain.into(),
        )
    }

    /// Stack discretised children on top of each other
    ///
    /// No domain checks are made: the children are usually the right-hand sides of
    /// different variables, which can share a domain.
    pub fn numeric_concatenation(children: Vec<Symbol>, domain: impl Into<DomainSet>) -> Self {
        Self::from_kind(SymbolKind::NumericConcatenation(children), domain.into())
    }

    pub fn id(&self) -> SymbolId {
        self.0.id
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.0.kind
    }

    pub fn domain(&self) -> &DomainSet {
        &self.0.domain
    }

    pub fn family(&self) -> Option<&Family> {
        self.0.family.as_ref()
    }

    /// Expected number of mesh points, if declared
    pub fn shape_hint(&self) -> Option<usize> {
        self.0.shape_hint
    }

    /// Name of a leaf, or a rendering of the expression for operators
    pub fn name(&self) -> String {
        match self.kind() {
            SymbolKind::Parameter { name }
            | SymbolKind::Variable { name }
            | SymbolKind::SpatialVariable { name }
            | SymbolKind::StateVector { name, .. } => name.clone(),
            _ => self.to_string(),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind(), SymbolKind::Variable { .. })
    }

    pub fn is_scalar_constant(&self, value: f64) -> bool {
        matches!(self.kind(), SymbolKind::Scalar(v) if *v == value)
    }

    /// Direct children, in order
    pub fn children(&self) -> Vec<&Symbol> {
        match self.kind() {
            SymbolKind::Scalar(_)
            | SymbolKind::Vector(_)
            | SymbolKind::Time
            | SymbolKind::Parameter { .. }
            | SymbolKind::Variable { .. }
            | SymbolKind::SpatialVariable { .. }
            | SymbolKind::StateVector { .. } => vec![],
            SymbolKind::Unary { child, .. }
            | SymbolKind::Gradient(child)
            | SymbolKind::Divergence(child)
            | SymbolKind::Integral(child)
            | SymbolKind::BoundaryValue { child, .. }
            | SymbolKind::Broadcast(child)
            | SymbolKind::MatrixMultiplication { child, .. } => vec![child],
            SymbolKind::Binary { left, right, .. } => vec![left, right],
            SymbolKind::DomainConcatenation(children)
            | SymbolKind::NumericConcatenation(children) => children.iter().collect(),
        }
    }

    /// Visit every distinct node once, parents before children
    pub fn visit(&self, f: &mut dyn FnMut(&Symbol)) {
        let mut seen = HashSet::new();
        let mut stack = vec![self];
        while let Some(symbol) = stack.pop() {
            if !seen.insert(symbol.id()) {
                continue;
            }
            f(symbol);
            // Reverse so that the first child is visited first
            for child in symbol.children().into_iter().rev() {
                stack.push(child);
            }
        }
    }

    /// All distinct nodes matching `predicate`, in visiting order
    pub fn find_all(&self, predicate: impl Fn(&Symbol) -> bool) -> Vec<Symbol> {
        let mut found = vec![];
        self.visit(&mut |s| {
            if predicate(s) {
                found.push(s.clone());
            }
        });
        found
    }

    /// Whether `other` (the same node) occurs anywhere in this expression
    pub fn has_symbol(&self, other: &Symbol) -> bool {
        let mut found = false;
        self.visit(&mut |s| found |= s == other);
        found
    }

    /// The distinct [`SymbolKind::Variable`] leaves of this expression
    pub fn variables(&self) -> Vec<Symbol> {
        self.find_all(|s| s.is_variable())
    }

    /// Whether the expression contains continuous spatial operators
    pub fn has_spatial_operator(&self) -> bool {
        !self
            .find_all(|s| {
                matches!(
                    s.kind(),
                    SymbolKind::Gradient(_)
                        | SymbolKind::Divergence(_)
                        | SymbolKind::Integral(_)
                        | SymbolKind::BoundaryValue { .. }
                )
            })
            .is_empty()
    }

    /// Whether the expression can be evaluated without any bindings
    pub fn is_constant(&self) -> bool {
        self.find_all(|s| {
            !matches!(
                s.kind(),
                SymbolKind::Scalar(_)
                    | SymbolKind::Vector(_)
                    | SymbolKind::Unary { .. }
                    | SymbolKind::Binary { .. }
                    | SymbolKind::NumericConcatenation(_)
                    | SymbolKind::MatrixMultiplication { .. }
            )
        })
        .is_empty()
    }

    /// A copy of this node tagged with `family`
    pub(crate) fn with_family(&self, family: Option<&Family>) -> Symbol {
        if self.family() == family {
            return self.clone();
        }
        Symbol::from_parts(
            self.kind().clone(),
            self.domain().clone(),
            family.cloned(),
            self.0.shape_hint,
        )
    }

    /// Rebuild this node with new children
    ///
    /// The new node keeps the kind, domain, family and shape hint of `self`.
    /// Leaves are returned unchanged.
    pub(crate) fn with_children(&self, mut children: Vec<Symbol>) -> Symbol {
        let kind = match self.kind() {
            SymbolKind::Scalar(_)
            | SymbolKind::Vector(_)
            | SymbolKind::Time
            | SymbolKind::Parameter { .. }
            | SymbolKind::Variable { .. }
            | SymbolKind::SpatialVariable { .. }
            | SymbolKind::StateVector { .. } => return self.clone(),
            SymbolKind::Binary { op, .. } => {
                let (Some(right), Some(left)) = (children.pop(), children.pop()) else {
                    return self.clone();
                };
                SymbolKind::Binary {
                    op: *op,
                    left,
                    right,
                }
            }
            SymbolKind::DomainConcatenation(_) => SymbolKind::DomainConcatenation(children),
            SymbolKind::NumericConcatenation(_) => SymbolKind::NumericConcatenation(children),
            single => {
                let Some(child) = children.pop() else {
                    return self.clone();
                };
                match single {
                    SymbolKind::Unary { op, .. } => SymbolKind::Unary { op: *op, child },
                    SymbolKind::Gradient(_) => SymbolKind::Gradient(child),
                    SymbolKind::Divergence(_) => SymbolKind::Divergence(child),
                    SymbolKind::Integral(_) => SymbolKind::Integral(child),
                    SymbolKind::BoundaryValue { side, .. } => {
                        SymbolKind::BoundaryValue { child, side: *side }
                    }
                    SymbolKind::Broadcast(_) => SymbolKind::Broadcast(child),
                    SymbolKind::MatrixMultiplication { matrix, .. } => {
                        SymbolKind::MatrixMultiplication {
                            matrix: matrix.clone(),
                            child,
                        }
                    }
                    _ => return self.clone(),
                }
            }
        };
        Symbol::from_parts(
            kind,
            self.domain().clone(),
            self.0.family.clone(),
            self.0.shape_hint,
        )
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl From<f64> for Symbol {
    fn from(value: f64) -> Self {
        Symbol::scalar(value)
    }
}

impl From<&Symbol> for Symbol {
    fn from(symbol: &Symbol) -> Self {
        symbol.clone()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}, id={})", self, self.id())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            SymbolKind::Scalar(value) => write!(f, "{}", value),
            SymbolKind::Vector(values) => write!(f, "vector({})", values.len()),
            SymbolKind::Time => write!(f, "t"),
            SymbolKind::Parameter { name }
            | SymbolKind::Variable { name }
            | SymbolKind::SpatialVariable { name } => write!(f, "{}", name),
            SymbolKind::StateVector { slice, .. } => {
                write!(f, "y[{}:{}]", slice.start, slice.end)
            }
            SymbolKind::Unary { op, child } => match op {
                UnaryOperator::Negate => write!(f, "-{}", child),
                _ => write!(f, "{}({})", op.name(), child),
            },
            SymbolKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            SymbolKind::Gradient(child) => write!(f, "grad({})", child),
            SymbolKind::Divergence(child) => write!(f, "div({})", child),
            SymbolKind::Integral(child) => write!(f, "integral({})", child),
            SymbolKind::BoundaryValue { child, side } => {
                write!(f, "boundary value({}, {})", child, side)
            }
            SymbolKind::Broadcast(child) => write!(f, "broadcast({})", child),
            SymbolKind::DomainConcatenation(children) => {
                write!(f, "concatenation(")?;
                write_list(f, children)?;
                write!(f, ")")
            }
            SymbolKind::NumericConcatenation(children) => {
                write!(f, "stack(")?;
                write_list(f, children)?;
                write!(f, ")")
            }
            SymbolKind::MatrixMultiplication { matrix, child } => {
                write!(f, "mat{}x{} @ {}", matrix.nrows(), matrix.ncols(), child)
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, children: &[Symbol]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[test]
    fn identity_is_by_node() {
        let a = Symbol::variable("c", Domain::Separator);
        let b = Symbol::variable("c", Domain::Separator);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn visit_shared_subexpression_once() {
        let c = Symbol::variable("c", DomainSet::empty());
        let shared = c.exp();
        let expr = shared.add(&shared).unwrap();
        let mut count = 0;
        expr.visit(&mut |_| count += 1);
        // add, exp, c
        assert_eq!(count, 3);
        assert_eq!(expr.variables(), vec![c]);
    }

    #[test]
    fn display() {
        let c = Symbol::variable("c", Domain::NegativeElectrode);
        let expr = Symbol::parameter("D").mul(&c.gradient().unwrap()).unwrap();
        assert_eq!(expr.to_string(), "(D * grad(c))");
        assert_eq!(c.neg().to_string(), "-c");
    }

    #[test]
    fn constants() {
        let c = Symbol::variable("c", DomainSet::empty());
        assert!(Symbol::scalar(1.0).add(2.0).unwrap().is_constant());
        assert!(!c.add(2.0).unwrap().is_constant());
        assert!(!Symbol::time().is_constant());
    }
}
