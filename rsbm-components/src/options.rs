//! Model options
//!
//! Every optional piece of physics is chosen through a closed enumeration, so an unknown
//! option is rejected when the options are parsed rather than when the model is built.
//!
//! ```rust
//! use rsbm_components::options::{ModelOptions, OperatingMode, SurfaceForm};
//!
//! let options = ModelOptions::from_toml_str(
//!     r#"
//!     operating_mode = "voltage"
//!     surface_form = "algebraic"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(options.operating_mode, OperatingMode::Voltage);
//! assert_eq!(options.surface_form, SurfaceForm::Algebraic);
//! ```

use rsbm_core::errors::{RSBMError, RSBMResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the external circuit holds fixed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// The applied current is prescribed
    #[default]
    Current,
    /// The terminal voltage is prescribed and the current is solved for
    Voltage,
    /// The electrical power is prescribed and the current is solved for
    Power,
}

/// How the surface potential difference in each electrode is determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceForm {
    /// Charging of the double layer, giving a differential equation
    #[default]
    Differential,
    /// Instantaneous balance of interfacial currents, giving an algebraic equation
    Algebraic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plating {
    #[default]
    None,
    /// Plating and stripping of lithium metal on the negative electrode
    Reversible,
}

/// Transport of lithium inside the active material particles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Particle {
    /// Fickian diffusion in spherical particles
    #[default]
    Fickian,
    /// Uniform concentration in each particle
    Uniform,
}

/// Options selecting the submodels of a cell model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub operating_mode: OperatingMode,
    pub surface_form: SurfaceForm,
    pub plating: Plating,
    pub particle: Particle,
}

impl ModelOptions {
    pub fn from_toml_str(source: &str) -> RSBMResult<Self> {
        toml::from_str(source)
            .map_err(|e| RSBMError::Model(format!("invalid model options: {}", e)))
    }

    pub fn with_operating_mode(mut self, operating_mode: OperatingMode) -> Self {
        self.operating_mode = operating_mode;
        self
    }

    pub fn with_surface_form(mut self, surface_form: SurfaceForm) -> Self {
        self.surface_form = surface_form;
        self
    }

    pub fn with_plating(mut self, plating: Plating) -> Self {
        self.plating = plating;
        self
    }

    pub fn with_particle(mut self, particle: Particle) -> Self {
        self.particle = particle;
        self
    }
}

impl fmt::Display for ModelOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operating mode: {:?}, surface form: {:?}, plating: {:?}, particle: {:?}",
            self.operating_mode, self.surface_form, self.plating, self.particle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsbm_core::errors::ErrorKind;

    #[test]
    fn test_defaults() {
        let options = ModelOptions::default();
        assert_eq!(options.operating_mode, OperatingMode::Current);
        assert_eq!(options.surface_form, SurfaceForm::Differential);
        assert_eq!(options.plating, Plating::None);
        assert_eq!(options.particle, Particle::Fickian);
    }

    #[test]
    fn test_partial_deserialization() {
        let options: ModelOptions = serde_json::from_str(r#"{"plating": "reversible"}"#).unwrap();
        assert_eq!(options.plating, Plating::Reversible);
        assert_eq!(options.particle, Particle::Fickian);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = ModelOptions::from_toml_str(r#"operating_mode = "resistance""#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
        assert!(err.to_string().contains("invalid model options"));
    }

    #[test]
    fn test_toml_round_trip() {
        let options = ModelOptions::default()
            .with_operating_mode(OperatingMode::Power)
            .with_particle(Particle::Uniform);
        let serialised = toml::to_string(&options).unwrap();
        assert_eq!(ModelOptions::from_toml_str(&serialised).unwrap(), options);
    }
}
