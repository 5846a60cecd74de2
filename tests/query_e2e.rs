//! End-to-end query behaviour over the light-element fixture.

mod common;

use cascadeql::query::StatisticsFilter;
use cascadeql::{
    InputSlot, NeutrinoType, ParticleClass, PinnedPresence, QueryDiagnostic, QueryEngine,
    QueryFilter, ReactionKind,
};

use common::n;

fn engine() -> QueryEngine {
    common::init_logging();
    QueryEngine::new(common::store())
}

fn hydrogen_fusion() -> cascadeql::query::QueryFilterBuilder {
    QueryFilter::builder().input(InputSlot::First, "H")
}

#[test]
fn limit_reports_true_total_and_caption() {
    let outcome = engine()
        .query(&hydrogen_fusion().limit(10).build(), ReactionKind::Fusion)
        .unwrap();

    assert_eq!(outcome.shown_count(), 10);
    assert_eq!(outcome.total_count, 11);
    assert_eq!(outcome.applied_limit, Some(10));
    assert!(outcome.is_truncated());
    assert_eq!(outcome.caption(), "showing 10 of 11 reactions");

    // p + p is the weakest hydrogen fusion and falls off the end.
    assert!(outcome
        .reactions
        .iter()
        .all(|r| r.inputs() != [n("H-1"), n("H-1")]));
}

#[test]
fn rows_are_sorted_by_energy_descending() {
    let outcome = engine()
        .query(&hydrogen_fusion().build(), ReactionKind::Fusion)
        .unwrap();
    let energies: Vec<f64> = outcome.reactions.iter().map(|r| r.energy_mev).collect();
    assert_eq!(
        energies,
        vec![23.847, 22.280, 19.814, 17.255, 16.695, 15.957, 7.551, 6.586, 5.606, 5.493, 1.442]
    );
}

#[test]
fn pinned_presence_distinguishes_limit_cut_from_absence() {
    let e = engine();

    let shown = e
        .query(&hydrogen_fusion().limit(10).pin("N-14").build(), ReactionKind::Fusion)
        .unwrap();
    assert_eq!(shown.pinned.unwrap().presence, PinnedPresence::InResults);

    let cut = e
        .query(&hydrogen_fusion().limit(5).pin("C-12").build(), ReactionKind::Fusion)
        .unwrap();
    let status = cut.pinned.unwrap();
    assert_eq!(status.presence, PinnedPresence::OnlyInFullDataset);
    assert_eq!(
        status.presence.to_string(),
        "exists in full dataset but not in limited results"
    );

    let element = e
        .query(&hydrogen_fusion().limit(5).pin("B").build(), ReactionKind::Fusion)
        .unwrap();
    assert_eq!(element.pinned.unwrap().presence, PinnedPresence::OnlyInFullDataset);

    let missing = e
        .query(&hydrogen_fusion().limit(5).pin("Fe").build(), ReactionKind::Fusion)
        .unwrap();
    assert_eq!(missing.pinned.unwrap().presence, PinnedPresence::Absent);
}

#[test]
fn element_sets_match_in_either_slot_order() {
    let e = engine();
    let forward = QueryFilter::builder()
        .input(InputSlot::First, "H")
        .input(InputSlot::Second, "Li")
        .build();
    let reversed = QueryFilter::builder()
        .input(InputSlot::First, "Li")
        .input(InputSlot::Second, "H")
        .build();

    let a = e.query(&forward, ReactionKind::TwoToTwo).unwrap();
    let b = e.query(&reversed, ReactionKind::TwoToTwo).unwrap();
    assert_eq!(a.reactions, b.reactions);

    let energies: Vec<f64> = a.reactions.iter().map(|r| r.energy_mev).collect();
    assert_eq!(energies, vec![22.373, 17.347, 4.022]);
    assert_eq!(a.element_symbols(), vec!["H", "He", "Li"]);
}

#[test]
fn energy_neutrino_and_output_filters_compose() {
    let e = engine();

    let window = e
        .query(
            &hydrogen_fusion().min_energy(10.0).max_energy(20.0).build(),
            ReactionKind::Fusion,
        )
        .unwrap();
    assert_eq!(window.total_count, 4);
    assert!(window
        .reactions
        .iter()
        .all(|r| (10.0..=20.0).contains(&r.energy_mev)));

    let neutrino = e
        .query(
            &hydrogen_fusion().neutrino(NeutrinoType::Left).build(),
            ReactionKind::Fusion,
        )
        .unwrap();
    assert_eq!(neutrino.total_count, 1);
    assert_eq!(neutrino.reactions[0].outputs(), [n("H-2")]);

    let helion = e
        .query(&hydrogen_fusion().output("He-3").build(), ReactionKind::TwoToTwo)
        .unwrap();
    assert_eq!(helion.total_count, 1);
    assert_eq!(helion.reactions[0].inputs(), [n("H-1"), n("Li-6")]);
}

#[test]
fn output_statistics_apply_to_every_output() {
    let fermions = StatisticsFilter {
        nuclear: Some(ParticleClass::Fermion),
        atomic: None,
    };
    let outcome = engine()
        .query(
            &hydrogen_fusion().output_statistics(fermions).build(),
            ReactionKind::Fusion,
        )
        .unwrap();
    let outputs: Vec<String> = outcome
        .reactions
        .iter()
        .map(|r| r.outputs()[0].to_string())
        .collect();
    assert_eq!(outputs, vec!["Be-9", "Be-7", "He-3"]);
}

#[test]
fn fission_only_consults_the_first_slot() {
    let e = engine();

    let be = e
        .query(
            &QueryFilter::builder().input(InputSlot::First, "Be").build(),
            ReactionKind::Fission,
        )
        .unwrap();
    assert_eq!(be.total_count, 1);
    assert_eq!(be.reactions[0].outputs(), [n("He-4"), n("He-4")]);

    let second_only = e
        .query(
            &QueryFilter::builder().input(InputSlot::Second, "Be").build(),
            ReactionKind::Fission,
        )
        .unwrap();
    assert_eq!(second_only.diagnostic, Some(QueryDiagnostic::NoInputSpecified));
}

#[test]
fn empty_and_inverted_filters_yield_diagnostics() {
    let e = engine();

    let none = e.query(&QueryFilter::default(), ReactionKind::TwoToTwo).unwrap();
    assert_eq!(none.diagnostic, Some(QueryDiagnostic::NoInputSpecified));
    assert_eq!(none.total_count, 0);

    let inverted = e
        .query(
            &hydrogen_fusion().min_energy(20.0).max_energy(5.0).build(),
            ReactionKind::Fusion,
        )
        .unwrap();
    assert!(matches!(
        inverted.diagnostic,
        Some(QueryDiagnostic::InvertedEnergyRange { .. })
    ));
    assert!(inverted.reactions.is_empty());
}

#[test]
fn full_dataset_ignores_limit_and_oversized_limits_are_clamped() {
    let e = engine();

    let full = e
        .query(&hydrogen_fusion().limit(3).use_full_dataset().build(), ReactionKind::Fusion)
        .unwrap();
    assert_eq!(full.applied_limit, None);
    assert_eq!(full.shown_count(), 11);
    assert!(!full.is_truncated());

    let clamped = e
        .query(&hydrogen_fusion().limit(1_000_000).build(), ReactionKind::Fusion)
        .unwrap();
    assert_eq!(clamped.applied_limit, Some(10_000));
    assert_eq!(clamped.shown_count(), 11);
}

#[test]
fn true_total_count_agrees_with_full_queries() {
    let e = engine();

    let exact = QueryFilter::exact_inputs(&[n("Li-7"), n("H-1")]);
    assert_eq!(e.true_total_count(&exact, ReactionKind::Fusion).unwrap(), 1);
    assert_eq!(e.true_total_count(&exact, ReactionKind::TwoToTwo).unwrap(), 1);

    let filter = hydrogen_fusion().min_energy(10.0).limit(2).build();
    let total = e.true_total_count(&filter, ReactionKind::Fusion).unwrap();
    let outcome = e.query(&filter, ReactionKind::Fusion).unwrap();
    assert_eq!(total, outcome.total_count);
    assert_eq!(total, 6);
}

#[test]
fn filters_round_trip_through_json() {
    let filter = hydrogen_fusion().pin("Li-7").limit(7).build();
    let json = serde_json::to_string(&filter).unwrap();
    let back: QueryFilter = serde_json::from_str(&json).unwrap();
    assert_eq!(back, filter);

    let outcome = engine().query(&back, ReactionKind::Fusion).unwrap();
    assert_eq!(outcome.applied_limit, Some(7));
}
