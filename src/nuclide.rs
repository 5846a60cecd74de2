//! Nuclide identity, element symbols and notation parsing.
//!
//! A nuclide is identified by its atomic number `Z` and mass number `A`.
//! The source tables spell hydrogen isotopes both as `H-2`/`H-3` and as the
//! dedicated symbols `D`/`T`; both spellings parse to the same identity.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Element symbols indexed by atomic number. Index 0 is the free neutron.
const ELEMENT_SYMBOLS: [&str; 119] = [
    "n", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Highest atomic number in the symbol table.
pub const MAX_Z: u8 = 118;

/// Upper bound on accepted mass numbers.
pub const MAX_A: u16 = 300;

/// Returns the canonical symbol for an atomic number.
#[must_use]
pub fn element_symbol(z: u8) -> Option<&'static str> {
    ELEMENT_SYMBOLS.get(usize::from(z)).copied()
}

fn normalize_symbol(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = first.to_ascii_uppercase().to_string();
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
            out
        }
    }
}

/// Looks up an atomic number by element symbol (case-insensitive).
///
/// `D` and `T` resolve to hydrogen.
#[must_use]
pub fn element_z(symbol: &str) -> Option<u8> {
    let symbol = normalize_symbol(symbol);
    if symbol == "D" || symbol == "T" {
        return Some(1);
    }
    // Normalization capitalizes, so `n` always reads as nitrogen.
    ELEMENT_SYMBOLS
        .iter()
        .position(|s| *s == symbol)
        .and_then(|idx| u8::try_from(idx).ok())
}

/// Stable identity of a nuclide.
///
/// Ordering is by `(Z, A)` ascending, which the cascade relies on for its
/// deterministic pairing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NuclideId {
    /// Atomic number.
    pub z: u8,
    /// Mass number.
    pub a: u16,
}

impl NuclideId {
    /// Creates a nuclide id after checking basic physical plausibility.
    pub fn new(z: u8, a: u16) -> Result<Self, ValidationError> {
        let plausible = z <= MAX_Z && a > 0 && a <= MAX_A && (u16::from(z) <= a);
        if !plausible {
            return Err(ValidationError::InvalidNotation {
                notation: format!("Z={z} A={a}"),
            });
        }
        Ok(Self { z, a })
    }

    /// Canonical element symbol for this nuclide.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        element_symbol(self.z).unwrap_or("?")
    }

    /// Parses notations like `Li-7`, `Li7`, `7Li`, `li 7`, `D` and `T`.
    pub fn parse(notation: &str) -> Result<Self, ValidationError> {
        match Selector::parse(notation) {
            Some(Selector::Nuclide(id)) => Ok(id),
            _ => Err(ValidationError::InvalidNotation {
                notation: notation.to_string(),
            }),
        }
    }
}

impl fmt::Display for NuclideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.symbol(), self.a)
    }
}

impl FromStr for NuclideId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A parsed user selector: either a whole element or one nuclide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// Every isotope of an element, by atomic number.
    Element(u8),
    /// A single nuclide.
    Nuclide(NuclideId),
}

fn symbol_mass_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]{1,3})\s*-?\s*(\d{1,3})$").ok())
        .as_ref()
}

fn mass_symbol_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,3})\s*-?\s*([A-Za-z]{1,3})$").ok())
        .as_ref()
}

fn nuclide_from_parts(symbol: &str, mass: &str) -> Option<NuclideId> {
    let a: u16 = mass.parse().ok()?;
    let normalized = normalize_symbol(symbol);
    // `D-2` and `T-3` are accepted, `D-3` is not.
    let expected_a = match normalized.as_str() {
        "D" => Some(2),
        "T" => Some(3),
        _ => None,
    };
    if let Some(expected) = expected_a {
        if a != expected {
            return None;
        }
    }
    let z = element_z(&normalized)?;
    NuclideId::new(z, a).ok()
}

impl Selector {
    /// Parses a selector string. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        match normalize_symbol(s).as_str() {
            "D" => return Some(Self::Nuclide(NuclideId { z: 1, a: 2 })),
            "T" => return Some(Self::Nuclide(NuclideId { z: 1, a: 3 })),
            _ => {}
        }

        if let Some(caps) = symbol_mass_regex().and_then(|re| re.captures(s)) {
            return nuclide_from_parts(&caps[1], &caps[2]).map(Self::Nuclide);
        }
        if let Some(caps) = mass_symbol_regex().and_then(|re| re.captures(s)) {
            return nuclide_from_parts(&caps[2], &caps[1]).map(Self::Nuclide);
        }

        element_z(s).map(Self::Element)
    }

    /// Returns true if the nuclide falls under this selector.
    #[must_use]
    pub fn covers(&self, id: NuclideId) -> bool {
        match self {
            Self::Element(z) => id.z == *z,
            Self::Nuclide(n) => *n == id,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(z) => write!(f, "{}", element_symbol(*z).unwrap_or("?")),
            Self::Nuclide(id) => write!(f, "{id}"),
        }
    }
}

/// Particle-statistics class (boson or fermion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleClass {
    /// Integer total spin.
    Boson,
    /// Half-integer total spin.
    Fermion,
}

impl ParticleClass {
    /// Nuclear class: an even nucleon count makes a boson.
    #[must_use]
    pub const fn nuclear_for(a: u16) -> Self {
        if a % 2 == 0 {
            Self::Boson
        } else {
            Self::Fermion
        }
    }

    /// Atomic class of the neutral atom: nucleons plus `Z` electrons.
    #[must_use]
    pub const fn atomic_for(z: u8, a: u16) -> Self {
        if (a as u32 + z as u32) % 2 == 0 {
            Self::Boson
        } else {
            Self::Fermion
        }
    }

    /// Parses the single-letter `b`/`f` codes used by the source tables.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "b" | "B" => Some(Self::Boson),
            "f" | "F" => Some(Self::Fermion),
            _ => None,
        }
    }
}

impl fmt::Display for ParticleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boson => write!(f, "boson"),
            Self::Fermion => write!(f, "fermion"),
        }
    }
}

/// Immutable nuclide reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nuclide {
    /// Identity.
    pub id: NuclideId,
    /// Whether the nuclide is stable.
    pub stable: bool,
    /// Decay modes (e.g. `B-`, `EC`, `A`), empty for stable nuclides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decay_modes: Vec<String>,
    /// Nuclear particle-statistics class.
    pub nuclear: ParticleClass,
    /// Atomic particle-statistics class.
    pub atomic: ParticleClass,
    /// Total binding energy in MeV.
    pub binding_energy_mev: f64,
    /// log10 of the half-life in seconds, if radioactive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_half_life: Option<f64>,
    /// Atomic mass in unified atomic mass units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_amu: Option<f64>,
}

impl Nuclide {
    /// Creates a stable nuclide with classes derived from `(Z, A)`.
    #[must_use]
    pub fn stable(id: NuclideId, binding_energy_mev: f64) -> Self {
        Self {
            id,
            stable: true,
            decay_modes: Vec::new(),
            nuclear: ParticleClass::nuclear_for(id.a),
            atomic: ParticleClass::atomic_for(id.z, id.a),
            binding_energy_mev,
            log_half_life: None,
            mass_amu: None,
        }
    }

    /// Creates a radioactive nuclide with classes derived from `(Z, A)`.
    #[must_use]
    pub fn radioactive(
        id: NuclideId,
        binding_energy_mev: f64,
        decay_modes: Vec<String>,
        log_half_life: Option<f64>,
    ) -> Self {
        Self {
            stable: false,
            decay_modes,
            log_half_life,
            ..Self::stable(id, binding_energy_mev)
        }
    }

    /// Element symbol.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        self.id.symbol()
    }

    /// Binding energy per nucleon in MeV.
    #[must_use]
    pub fn binding_energy_per_nucleon(&self) -> f64 {
        self.binding_energy_mev / f64::from(self.id.a)
    }
}
