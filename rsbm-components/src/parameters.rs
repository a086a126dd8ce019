//! Parameters of a lithium-ion cell
//!
//! [`CellParameters`] is a typed parameter set, grouped by the part of the cell each value
//! belongs to. It is flattened into the named [`ParameterValues`] read by the submodels with
//! [`CellParameters::parameter_values`], and describes the cell geometry through
//! [`CellParameters::geometry`].
//!
//! The defaults describe a 5 Ah pouch cell with a graphite negative electrode and a
//! nickel-rich positive electrode.
//!
//! Parameter sets can be read from TOML. Omitted groups keep their defaults, but a group
//! that is present must be given in full:
//!
//! ```rust
//! use rsbm_components::parameters::CellParameters;
//!
//! let parameters = CellParameters::from_toml_str(
//!     r#"
//!     current_function = 2.5
//!
//!     [separator]
//!     thickness = 2.0e-5
//!     porosity = 0.5
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(parameters.current_function, 2.5);
//! assert_eq!(parameters.positive.thickness, 75.6e-6);
//! ```

use crate::submodels::{FARADAY_CONSTANT, GAS_CONSTANT, REFERENCE_TEMPERATURE};
use rsbm_core::domain::{Domain, Electrode};
use rsbm_core::errors::{RSBMError, RSBMResult};
use rsbm_core::mesh::Geometry;
use rsbm_core::parameters::ParameterValues;
use serde::{Deserialize, Serialize};

/// Faraday constant
/// unit: C/mol
pub const FARADAY: f64 = 96485.33212;

/// Ideal gas constant
/// unit: J/(K mol)
pub const IDEAL_GAS: f64 = 8.314462618;

/// Parameters of one electrode and its active material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeParameters {
    /// unit: m
    pub thickness: f64,

    /// Volume fraction of the electrode occupied by active material
    pub active_material_volume_fraction: f64,

    /// Volume fraction of the electrode occupied by electrolyte
    pub porosity: f64,

    /// unit: m
    pub particle_radius: f64,

    /// Diffusivity of lithium in the active material
    /// unit: m^2/s
    pub particle_diffusivity: f64,

    /// unit: mol/m^3
    pub maximum_concentration: f64,

    /// Uniform concentration in the particles at the start of a simulation
    /// unit: mol/m^3
    pub initial_concentration: f64,

    /// Rate constant of the intercalation reaction
    /// unit: A m^2.5 / mol^1.5
    pub reaction_rate_constant: f64,

    /// unit: F/m^2
    pub double_layer_capacity: f64,
}

impl ElectrodeParameters {
    /// Graphite
    pub fn negative() -> Self {
        Self {
            thickness: 85.2e-6,
            active_material_volume_fraction: 0.75,
            porosity: 0.25,
            particle_radius: 5.86e-6,
            particle_diffusivity: 3.3e-14,
            maximum_concentration: 33133.0,
            initial_concentration: 29866.0,
            reaction_rate_constant: 6.48e-7,
            double_layer_capacity: 0.2,
        }
    }

    /// Nickel-rich oxide
    pub fn positive() -> Self {
        Self {
            thickness: 75.6e-6,
            active_material_volume_fraction: 0.665,
            porosity: 0.335,
            particle_radius: 5.22e-6,
            particle_diffusivity: 4e-15,
            maximum_concentration: 63104.0,
            initial_concentration: 17038.0,
            reaction_rate_constant: 3.42e-6,
            double_layer_capacity: 0.2,
        }
    }

    fn insert_into(&self, electrode: Electrode, values: &mut ParameterValues) {
        let title = electrode.title();
        let name = electrode.name();
        values.insert(format!("{} electrode thickness [m]", title), self.thickness);
        values.insert(
            format!("{} electrode active material volume fraction", title),
            self.active_material_volume_fraction,
        );
        values.insert(format!("{} electrode porosity", title), self.porosity);
        values.insert(format!("{} particle radius [m]", title), self.particle_radius);
        values.insert(
            format!("{} particle diffusivity [m2.s-1]", title),
            self.particle_diffusivity,
        );
        values.insert(
            format!("Maximum concentration in {} electrode [mol.m-3]", name),
            self.maximum_concentration,
        );
        values.insert(
            format!("Initial concentration in {} electrode [mol.m-3]", name),
            self.initial_concentration,
        );
        values.insert(
            format!("{} electrode reaction rate constant [A.m2.5.mol-1.5]", title),
            self.reaction_rate_constant,
        );
        values.insert(
            format!("{} electrode double-layer capacity [F.m-2]", title),
            self.double_layer_capacity,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparatorParameters {
    /// unit: m
    pub thickness: f64,
    pub porosity: f64,
}

impl Default for SeparatorParameters {
    fn default() -> Self {
        Self {
            thickness: 12e-6,
            porosity: 0.47,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrolyteParameters {
    /// unit: m^2/s
    pub diffusivity: f64,

    /// Fraction of the current carried by the cations
    pub cation_transference_number: f64,

    /// unit: mol/m^3
    pub initial_concentration: f64,
}

impl Default for ElectrolyteParameters {
    fn default() -> Self {
        Self {
            diffusivity: 1.769e-10,
            cation_transference_number: 0.2594,
            initial_concentration: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatingParameters {
    /// unit: m/s
    pub kinetic_rate_constant: f64,
    pub transfer_coefficient: f64,

    /// unit: mol/m^3
    pub initial_plated_concentration: f64,
}

impl Default for PlatingParameters {
    fn default() -> Self {
        Self {
            kinetic_rate_constant: 1e-9,
            transfer_coefficient: 0.5,
            initial_plated_concentration: 0.0,
        }
    }
}

/// Parameters of a whole cell and of the way it is operated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellParameters {
    /// Applied current, positive on discharge
    /// unit: A
    /// default: 5.0
    pub current_function: f64,

    /// Terminal voltage held by voltage control
    /// unit: V
    /// default: 3.8
    pub voltage_function: f64,

    /// Power drawn under power control
    /// unit: W
    /// default: 18.0
    pub power_function: f64,

    /// unit: m^2
    /// default: 0.1027
    pub electrode_area: f64,

    /// unit: K
    /// default: 298.15
    pub temperature: f64,

    pub negative: ElectrodeParameters,
    pub separator: SeparatorParameters,
    pub positive: ElectrodeParameters,
    pub electrolyte: ElectrolyteParameters,
    pub plating: PlatingParameters,
}

impl Default for CellParameters {
    fn default() -> Self {
        Self {
            current_function: 5.0,
            voltage_function: 3.8,
            power_function: 18.0,
            electrode_area: 0.1027,
            temperature: 298.15,
            negative: ElectrodeParameters::negative(),
            separator: SeparatorParameters::default(),
            positive: ElectrodeParameters::positive(),
            electrolyte: ElectrolyteParameters::default(),
            plating: PlatingParameters::default(),
        }
    }
}

impl CellParameters {
    pub fn from_toml_str(source: &str) -> RSBMResult<Self> {
        toml::from_str(source)
            .map_err(|e| RSBMError::Model(format!("invalid cell parameters: {}", e)))
    }

    pub fn electrode(&self, electrode: Electrode) -> &ElectrodeParameters {
        match electrode {
            Electrode::Negative => &self.negative,
            Electrode::Positive => &self.positive,
        }
    }

    /// The named values read by the submodels
    pub fn parameter_values(&self) -> ParameterValues {
        let mut values = ParameterValues::from([
            (FARADAY_CONSTANT, FARADAY),
            (GAS_CONSTANT, IDEAL_GAS),
            (REFERENCE_TEMPERATURE, self.temperature),
            ("Current function [A]", self.current_function),
            ("Voltage function [V]", self.voltage_function),
            ("Power function [W]", self.power_function),
            ("Electrode area [m2]", self.electrode_area),
            ("Separator thickness [m]", self.separator.thickness),
            ("Separator porosity", self.separator.porosity),
            ("Electrolyte diffusivity [m2.s-1]", self.electrolyte.diffusivity),
            (
                "Cation transference number",
                self.electrolyte.cation_transference_number,
            ),
            (
                "Initial concentration in electrolyte [mol.m-3]",
                self.electrolyte.initial_concentration,
            ),
            (
                "Lithium plating kinetic rate constant [m.s-1]",
                self.plating.kinetic_rate_constant,
            ),
            (
                "Lithium plating transfer coefficient",
                self.plating.transfer_coefficient,
            ),
            (
                "Initial plated lithium concentration [mol.m-3]",
                self.plating.initial_plated_concentration,
            ),
        ]);
        self.negative.insert_into(Electrode::Negative, &mut values);
        self.positive.insert_into(Electrode::Positive, &mut values);
        values
    }

    /// Dimensional geometry of the cell
    ///
    /// The electrodes and separator are laid end to end from the negative current
    /// collector. Each particle spans its own radius, and the current collector is a point.
    pub fn geometry(&self) -> Geometry {
        let l_n = self.negative.thickness;
        let l_s = self.separator.thickness;
        let l_p = self.positive.thickness;
        Geometry::new()
            .with_interval(Domain::NegativeElectrode, 0.0, l_n)
            .with_interval(Domain::Separator, l_n, l_n + l_s)
            .with_interval(Domain::PositiveElectrode, l_n + l_s, l_n + l_s + l_p)
            .with_interval(Domain::NegativeParticle, 0.0, self.negative.particle_radius)
            .with_interval(Domain::PositiveParticle, 0.0, self.positive.particle_radius)
            .with_point(Domain::CurrentCollector)
    }
}
