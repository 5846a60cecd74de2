//! Light-element fixture shared by the integration tests.
//!
//! Energies are Q-values in MeV for the listed channels.

#![allow(dead_code)]

use std::sync::Arc;

use cascadeql::{InMemoryReactionStore, NeutrinoType, Nuclide, NuclideId, Reaction};

pub fn n(notation: &str) -> NuclideId {
    notation.parse().unwrap()
}

fn nuclides() -> Vec<Nuclide> {
    let radioactive = |s: &str, be: f64, mode: &str, log_t: f64| {
        Nuclide::radioactive(n(s), be, vec![mode.to_string()], Some(log_t))
    };
    vec![
        Nuclide::stable(n("H-1"), 0.0),
        Nuclide::stable(n("H-2"), 2.224),
        radioactive("H-3", 8.482, "B-", 8.59),
        Nuclide::stable(n("He-3"), 7.718),
        Nuclide::stable(n("He-4"), 28.296),
        Nuclide::stable(n("Li-6"), 31.994),
        Nuclide::stable(n("Li-7"), 39.245),
        radioactive("Be-7", 37.600, "EC", 6.66),
        radioactive("Be-8", 56.500, "A", -16.1),
        Nuclide::stable(n("Be-9"), 58.165),
        Nuclide::stable(n("B-10"), 64.751),
        Nuclide::stable(n("B-11"), 76.205),
        Nuclide::stable(n("C-12"), 92.162),
        Nuclide::stable(n("C-13"), 97.108),
        Nuclide::stable(n("N-14"), 104.659),
    ]
}

pub fn reactions() -> Vec<Reaction> {
    vec![
        // Fusion
        Reaction::fusion([n("H-1"), n("H-1")], n("H-2"), 1.442).with_neutrino(NeutrinoType::Left),
        Reaction::fusion([n("H-1"), n("H-2")], n("He-3"), 5.493),
        Reaction::fusion([n("H-2"), n("H-2")], n("He-4"), 23.847),
        Reaction::fusion([n("H-1"), n("H-3")], n("He-4"), 19.814),
        Reaction::fusion([n("H-1"), n("Li-6")], n("Be-7"), 5.606),
        Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255),
        Reaction::fusion([n("H-2"), n("Li-6")], n("Be-8"), 22.280),
        Reaction::fusion([n("H-2"), n("Li-7")], n("Be-9"), 16.695),
        Reaction::fusion([n("H-1"), n("Be-9")], n("B-10"), 6.586),
        Reaction::fusion([n("H-1"), n("B-11")], n("C-12"), 15.957),
        Reaction::fusion([n("H-1"), n("C-13")], n("N-14"), 7.551),
        Reaction::fusion([n("He-4"), n("He-4")], n("Be-8"), -0.092),
        Reaction::fusion([n("He-4"), n("Be-8")], n("C-12"), 7.367),
        // Fission
        Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092),
        Reaction::fission(n("Li-6"), [n("H-2"), n("He-4")], -1.474),
        Reaction::fission(n("B-10"), [n("Li-6"), n("He-4")], -4.460),
        Reaction::fission(n("C-12"), [n("He-4"), n("Be-8")], -7.367),
        // Two-to-two
        Reaction::two_to_two([n("H-1"), n("Li-7")], [n("He-4"), n("He-4")], 17.347),
        Reaction::two_to_two([n("H-2"), n("Li-6")], [n("He-4"), n("He-4")], 22.373),
        Reaction::two_to_two([n("H-2"), n("H-2")], [n("H-1"), n("H-3")], 4.033),
        Reaction::two_to_two([n("H-2"), n("He-3")], [n("H-1"), n("He-4")], 18.353),
        Reaction::two_to_two([n("H-1"), n("B-11")], [n("He-4"), n("Be-8")], 8.590),
        Reaction::two_to_two([n("H-1"), n("Li-6")], [n("He-3"), n("He-4")], 4.022),
        Reaction::two_to_two([n("H-1"), n("Be-9")], [n("Li-6"), n("He-4")], 2.125),
    ]
}

pub fn store() -> Arc<InMemoryReactionStore> {
    let mut builder = InMemoryReactionStore::builder();
    for nuclide in nuclides() {
        builder.add_nuclide(nuclide).unwrap();
    }
    builder.extend_reactions(reactions());
    Arc::new(builder.build().unwrap())
}

/// Installs a test logger once; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
