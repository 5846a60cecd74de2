//! Reaction records.
//!
//! Reactions come in three shapes (fusion 2→1, fission 1→2, two-to-two 2→2).
//! Each carries a release energy copied verbatim from the dataset and a stable
//! identity used for deduplication across query calls and cascade loops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nuclide::NuclideId;

/// Reaction table selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Two inputs fuse into one output.
    Fusion,
    /// One input splits into two outputs.
    Fission,
    /// Two inputs rearrange into two outputs.
    TwoToTwo,
}

impl ReactionKind {
    /// All kinds, in cascade merge order.
    pub const ALL: [Self; 3] = [Self::Fusion, Self::Fission, Self::TwoToTwo];

    /// Number of input nuclides for this kind.
    #[must_use]
    pub const fn input_arity(self) -> usize {
        match self {
            Self::Fusion | Self::TwoToTwo => 2,
            Self::Fission => 1,
        }
    }

    const fn tag(self) -> u8 {
        match self {
            Self::Fusion => 1,
            Self::Fission => 2,
            Self::TwoToTwo => 3,
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fusion => write!(f, "fusion"),
            Self::Fission => write!(f, "fission"),
            Self::TwoToTwo => write!(f, "two_to_two"),
        }
    }
}

/// Neutrino involvement recorded for a reaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutrinoType {
    /// No neutrino emitted or absorbed.
    #[default]
    None,
    /// Left-handed neutrino involvement.
    Left,
    /// Right-handed neutrino involvement.
    Right,
}

impl NeutrinoType {
    /// Parses the dataset's `neutrino` column values.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "left" | "left-handed" => Some(Self::Left),
            "right" | "right-handed" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Stable reaction identity.
///
/// Derived from the reaction kind plus sorted inputs and sorted outputs, so two
/// rows that list the same participants in a different order share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionId([u8; 16]);

impl ReactionId {
    fn derive(kind: ReactionKind, inputs: &[NuclideId], outputs: &[NuclideId]) -> Self {
        let mut inputs = inputs.to_vec();
        let mut outputs = outputs.to_vec();
        inputs.sort_unstable();
        outputs.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"cascadeql.reaction.v1");
        hasher.update(&[kind.tag()]);
        for (section, ids) in [(b'i', &inputs), (b'o', &outputs)] {
            hasher.update(&[section]);
            for id in ids {
                hasher.update(&[id.z]);
                hasher.update(&id.a.to_le_bytes());
            }
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest.as_bytes()[..16]);
        Self(out)
    }

    /// Raw identity bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Participants of a reaction, by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactionShape {
    /// 2 → 1.
    Fusion {
        /// Input nuclides.
        inputs: [NuclideId; 2],
        /// Output nuclide.
        output: NuclideId,
    },
    /// 1 → 2.
    Fission {
        /// Input nuclide.
        input: NuclideId,
        /// Output nuclides.
        outputs: [NuclideId; 2],
    },
    /// 2 → 2.
    TwoToTwo {
        /// Input nuclides.
        inputs: [NuclideId; 2],
        /// Output nuclides.
        outputs: [NuclideId; 2],
    },
}

impl ReactionShape {
    /// Reaction kind for this shape.
    #[must_use]
    pub const fn kind(&self) -> ReactionKind {
        match self {
            Self::Fusion { .. } => ReactionKind::Fusion,
            Self::Fission { .. } => ReactionKind::Fission,
            Self::TwoToTwo { .. } => ReactionKind::TwoToTwo,
        }
    }

    /// Input nuclides (one or two).
    #[must_use]
    pub fn inputs(&self) -> &[NuclideId] {
        match self {
            Self::Fusion { inputs, .. } | Self::TwoToTwo { inputs, .. } => inputs,
            Self::Fission { input, .. } => std::slice::from_ref(input),
        }
    }

    /// Output nuclides (one or two).
    #[must_use]
    pub fn outputs(&self) -> &[NuclideId] {
        match self {
            Self::Fusion { output, .. } => std::slice::from_ref(output),
            Self::Fission { outputs, .. } | Self::TwoToTwo { outputs, .. } => outputs,
        }
    }
}

/// An immutable reaction fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Stable identity.
    pub id: ReactionId,
    /// Participants.
    pub shape: ReactionShape,
    /// Release energy in MeV, as stored in the dataset.
    pub energy_mev: f64,
    /// Neutrino class.
    pub neutrino: NeutrinoType,
}

impl Reaction {
    fn from_shape(shape: ReactionShape, energy_mev: f64, neutrino: NeutrinoType) -> Self {
        Self {
            id: ReactionId::derive(shape.kind(), shape.inputs(), shape.outputs()),
            shape,
            energy_mev,
            neutrino,
        }
    }

    /// Builds a fusion reaction `a + b → output`.
    #[must_use]
    pub fn fusion(inputs: [NuclideId; 2], output: NuclideId, energy_mev: f64) -> Self {
        Self::from_shape(
            ReactionShape::Fusion { inputs, output },
            energy_mev,
            NeutrinoType::None,
        )
    }

    /// Builds a fission reaction `input → a + b`.
    #[must_use]
    pub fn fission(input: NuclideId, outputs: [NuclideId; 2], energy_mev: f64) -> Self {
        Self::from_shape(
            ReactionShape::Fission { input, outputs },
            energy_mev,
            NeutrinoType::None,
        )
    }

    /// Builds a two-to-two reaction `a + b → c + d`.
    #[must_use]
    pub fn two_to_two(inputs: [NuclideId; 2], outputs: [NuclideId; 2], energy_mev: f64) -> Self {
        Self::from_shape(
            ReactionShape::TwoToTwo { inputs, outputs },
            energy_mev,
            NeutrinoType::None,
        )
    }

    /// Sets the neutrino class.
    #[must_use]
    pub const fn with_neutrino(mut self, neutrino: NeutrinoType) -> Self {
        self.neutrino = neutrino;
        self
    }

    /// Reaction kind.
    #[must_use]
    pub const fn kind(&self) -> ReactionKind {
        self.shape.kind()
    }

    /// Input nuclides.
    #[must_use]
    pub fn inputs(&self) -> &[NuclideId] {
        self.shape.inputs()
    }

    /// Output nuclides.
    #[must_use]
    pub fn outputs(&self) -> &[NuclideId] {
        self.shape.outputs()
    }

    /// Every participant (inputs then outputs).
    pub fn participants(&self) -> impl Iterator<Item = NuclideId> + '_ {
        self.inputs().iter().chain(self.outputs().iter()).copied()
    }

    /// Sorted input key, as used by the store's exact-input index.
    #[must_use]
    pub fn input_key(&self) -> InputKey {
        InputKey::new(self.inputs())
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[NuclideId]| {
            ids.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(
            f,
            "{} → {} ({:.3} MeV)",
            join(self.inputs()),
            join(self.outputs()),
            self.energy_mev
        )
    }
}

/// Order-independent key over one or two input nuclides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputKey {
    first: NuclideId,
    second: Option<NuclideId>,
}

impl InputKey {
    /// Builds a key from one or two inputs; extra entries are ignored.
    #[must_use]
    pub fn new(inputs: &[NuclideId]) -> Self {
        match inputs {
            [only] => Self {
                first: *only,
                second: None,
            },
            [a, b, ..] => Self {
                first: (*a).min(*b),
                second: Some((*a).max(*b)),
            },
            [] => Self {
                first: NuclideId { z: 0, a: 0 },
                second: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> NuclideId {
        NuclideId::parse(s).unwrap()
    }

    #[test]
    fn identity_ignores_participant_order() {
        let a = Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255);
        let b = Reaction::fusion([n("Li-7"), n("H-1")], n("Be-8"), 17.255);
        assert_eq!(a.id, b.id);

        let c = Reaction::two_to_two([n("H-1"), n("Li-7")], [n("He-4"), n("He-4")], 17.347);
        let d = Reaction::two_to_two([n("Li-7"), n("H-1")], [n("He-4"), n("He-4")], 17.347);
        assert_eq!(c.id, d.id);
    }

    #[test]
    fn identity_distinguishes_kind_and_direction() {
        let fusion = Reaction::fusion([n("He-4"), n("He-4")], n("Be-8"), -0.092);
        let fission = Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092);
        assert_ne!(fusion.id, fission.id);

        let forward = Reaction::two_to_two([n("H-1"), n("Li-7")], [n("He-4"), n("He-4")], 17.3);
        let reverse = Reaction::two_to_two([n("He-4"), n("He-4")], [n("H-1"), n("Li-7")], -17.3);
        assert_ne!(forward.id, reverse.id);
    }

    #[test]
    fn identity_is_stable_and_hex_encoded() {
        let a = Reaction::fusion([n("H-2"), n("H-2")], n("He-4"), 23.847);
        let again = Reaction::fusion([n("H-2"), n("H-2")], n("He-4"), 1.0);
        assert_eq!(a.id, again.id, "energy is not part of the identity");
        let text = a.id.to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn shape_accessors() {
        let r = Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092);
        assert_eq!(r.kind(), ReactionKind::Fission);
        assert_eq!(r.inputs(), &[n("Be-8")]);
        assert_eq!(r.outputs().len(), 2);
        assert_eq!(r.participants().count(), 3);
        assert_eq!(r.to_string(), "Be-8 → He-4 + He-4 (0.092 MeV)");
    }

    #[test]
    fn input_key_is_order_independent() {
        assert_eq!(
            InputKey::new(&[n("Li-7"), n("H-1")]),
            InputKey::new(&[n("H-1"), n("Li-7")])
        );
        assert_ne!(InputKey::new(&[n("H-1")]), InputKey::new(&[n("H-1"), n("H-1")]));
    }

    #[test]
    fn neutrino_codes() {
        assert_eq!(NeutrinoType::from_code("none"), Some(NeutrinoType::None));
        assert_eq!(NeutrinoType::from_code("Left"), Some(NeutrinoType::Left));
        assert_eq!(NeutrinoType::from_code("right-handed"), Some(NeutrinoType::Right));
        assert_eq!(NeutrinoType::from_code("sideways"), None);
    }
}
