//! Cascade parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::nuclide::{NuclideId, ParticleClass};
use crate::reaction::ReactionKind;

/// Hard ceiling on `max_loops`.
pub const MAX_LOOPS: usize = 100;

/// Validated inputs of one cascade run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeParameters {
    /// Starting nuclides; the active pool begins as exactly this set.
    pub fuel: BTreeSet<NuclideId>,
    /// Minimum fusion release energy (MeV).
    pub min_fusion_mev: f64,
    /// Minimum fission release energy (MeV).
    pub min_fission_mev: f64,
    /// Minimum two-to-two release energy (MeV).
    pub min_two_to_two_mev: f64,
    /// Pool nuclides considered for pairing per loop.
    pub max_nuclides_to_pair: usize,
    /// Upper bound on loops executed.
    pub max_loops: usize,
    /// Boson outputs rejoin the pool.
    pub feedback_bosons: bool,
    /// Fermion outputs rejoin the pool.
    pub feedback_fermions: bool,
}

impl Default for CascadeParameters {
    fn default() -> Self {
        Self {
            fuel: BTreeSet::new(),
            min_fusion_mev: 1.0,
            min_fission_mev: 1.0,
            min_two_to_two_mev: 1.0,
            max_nuclides_to_pair: 20,
            max_loops: 10,
            feedback_bosons: true,
            feedback_fermions: true,
        }
    }
}

impl CascadeParameters {
    /// Start building parameters from notation strings.
    #[must_use]
    pub fn builder() -> CascadeParametersBuilder {
        CascadeParametersBuilder::default()
    }

    /// Default parameters over the given fuel.
    #[must_use]
    pub fn with_fuel(fuel: impl IntoIterator<Item = NuclideId>) -> Self {
        Self {
            fuel: fuel.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Threshold for one reaction kind.
    #[must_use]
    pub const fn min_energy(&self, kind: ReactionKind) -> f64 {
        match kind {
            ReactionKind::Fusion => self.min_fusion_mev,
            ReactionKind::Fission => self.min_fission_mev,
            ReactionKind::TwoToTwo => self.min_two_to_two_mev,
        }
    }

    /// True if outputs of this nuclear class rejoin the pool.
    #[must_use]
    pub const fn feeds_back(&self, class: ParticleClass) -> bool {
        match class {
            ParticleClass::Boson => self.feedback_bosons,
            ParticleClass::Fermion => self.feedback_fermions,
        }
    }

    /// True if either feedback flag is set.
    #[must_use]
    pub const fn feedback_enabled(&self) -> bool {
        self.feedback_bosons || self.feedback_fermions
    }

    /// Validate bounds. Store membership of the fuel is checked by the
    /// simulator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fuel.is_empty() {
            return Err(ValidationError::EmptyFuel);
        }
        if self.max_nuclides_to_pair == 0 {
            return Err(invalid("max_nuclides_to_pair", "must be > 0"));
        }
        if self.max_loops == 0 {
            return Err(invalid("max_loops", "must be > 0"));
        }
        if self.max_loops > MAX_LOOPS {
            return Err(invalid(
                "max_loops",
                &format!("must be <= {MAX_LOOPS}"),
            ));
        }
        for (field, value) in [
            ("min_fusion_mev", self.min_fusion_mev),
            ("min_fission_mev", self.min_fission_mev),
            ("min_two_to_two_mev", self.min_two_to_two_mev),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidParameter {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Builder accepting fuel in nuclide notation (`"Li-7"`, `"7Li"`, `"D"`).
///
/// # Example
/// ```
/// use cascadeql::cascade::CascadeParameters;
///
/// let params = CascadeParameters::builder()
///     .fuel("H-1")
///     .fuel("Li7")
///     .max_loops(5)
///     .feedback(false, false)
///     .build()
///     .unwrap();
/// assert_eq!(params.fuel.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CascadeParametersBuilder {
    fuel: Vec<String>,
    params: CascadeParameters,
}

impl CascadeParametersBuilder {
    /// Add a fuel nuclide.
    #[must_use]
    pub fn fuel(mut self, notation: &str) -> Self {
        self.fuel.push(notation.to_string());
        self
    }

    /// Add a fuel nuclide by id.
    #[must_use]
    pub fn fuel_id(mut self, id: NuclideId) -> Self {
        self.params.fuel.insert(id);
        self
    }

    /// Minimum fusion energy.
    #[must_use]
    pub const fn min_fusion_mev(mut self, mev: f64) -> Self {
        self.params.min_fusion_mev = mev;
        self
    }

    /// Minimum fission energy.
    #[must_use]
    pub const fn min_fission_mev(mut self, mev: f64) -> Self {
        self.params.min_fission_mev = mev;
        self
    }

    /// Minimum two-to-two energy.
    #[must_use]
    pub const fn min_two_to_two_mev(mut self, mev: f64) -> Self {
        self.params.min_two_to_two_mev = mev;
        self
    }

    /// Pairing cap.
    #[must_use]
    pub const fn max_nuclides_to_pair(mut self, n: usize) -> Self {
        self.params.max_nuclides_to_pair = n;
        self
    }

    /// Loop cap.
    #[must_use]
    pub const fn max_loops(mut self, n: usize) -> Self {
        self.params.max_loops = n;
        self
    }

    /// Feedback flags.
    #[must_use]
    pub const fn feedback(mut self, bosons: bool, fermions: bool) -> Self {
        self.params.feedback_bosons = bosons;
        self.params.feedback_fermions = fermions;
        self
    }

    /// Parse fuel and validate.
    pub fn build(mut self) -> Result<CascadeParameters, ValidationError> {
        for notation in &self.fuel {
            let id = NuclideId::parse(notation).map_err(|_| ValidationError::UnknownFuelNuclide {
                notation: notation.clone(),
            })?;
            self.params.fuel.insert(id);
        }
        self.params.validate()?;
        Ok(self.params)
    }
}
