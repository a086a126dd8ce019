//! Tests for the model module.
//!
//! These cover assembly from submodels and every clause of the well-posedness check.

#[cfg(test)]
mod builder;
