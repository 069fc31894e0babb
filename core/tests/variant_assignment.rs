//! Variant assignment is deterministic alternation, never randomized.

use outreach_core::engine::ExperimentEngine;
use outreach_core::leadgen::LeadGenerator;
use outreach_core::model::VariantLabel;
use outreach_core::rng::{RngBank, StageSlot};

#[test]
fn even_indices_get_a_odd_indices_get_b() {
    for index in 0..10 {
        let expected = if index % 2 == 0 {
            VariantLabel::A
        } else {
            VariantLabel::B
        };
        assert_eq!(ExperimentEngine::variant_for_index(index), expected);
    }
}

#[test]
fn batch_split_is_ceil_floor() {
    for batch_size in [1usize, 2, 5, 7, 12] {
        let assignments: Vec<VariantLabel> = (0..batch_size)
            .map(ExperimentEngine::variant_for_index)
            .collect();
        let a_count = assignments.iter().filter(|v| **v == VariantLabel::A).count();
        let b_count = assignments.iter().filter(|v| **v == VariantLabel::B).count();

        assert_eq!(a_count, batch_size.div_ceil(2), "A count for N={batch_size}");
        assert_eq!(b_count, batch_size / 2, "B count for N={batch_size}");
    }
}

#[test]
fn results_and_messages_carry_the_assigned_variant() {
    let mut rng = RngBank::new(11).for_stage(StageSlot::LeadGen);
    let leads = LeadGenerator::generate(7, &mut rng);

    let mut engine = ExperimentEngine::build_test("variant-test".into(), 11).unwrap();
    let experiment = engine
        .run(leads, "Focus on ROI.", "Focus on social proof.")
        .unwrap();

    assert_eq!(experiment.results.len(), 7);
    for (index, (result, message)) in experiment
        .results
        .iter()
        .zip(experiment.messages.iter())
        .enumerate()
    {
        let expected = ExperimentEngine::variant_for_index(index);
        assert_eq!(result.variant_chosen, expected, "result variant at {index}");
        assert_eq!(message.variant_type, expected, "message variant at {index}");
    }
}

#[test]
fn hypotheses_are_bound_to_their_arm() {
    let mut engine = ExperimentEngine::build_test("binding-test".into(), 3).unwrap();
    let experiment = engine
        .run(
            LeadGenerator::sample_batch(),
            "Focus on ROI.",
            "Focus on social proof.",
        )
        .unwrap();

    assert_eq!(experiment.variant_a.variant, VariantLabel::A);
    assert_eq!(experiment.variant_a.description, "Focus on ROI.");
    assert_eq!(experiment.variant_b.variant, VariantLabel::B);
    assert_eq!(experiment.variant_b.description, "Focus on social proof.");
}
