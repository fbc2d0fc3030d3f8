//! Test suite for the buffers submodule.
//!
//! Test categories:
//! 1. Construction and validation
//! 2. Cursor bookkeeping (pre-full, wraparound, reset)
//! 3. Sequential reads (drain_all projections, tensor conversion)
//! 4. Circular sampling (bounds, next-state pairing, staging)
//! 5. ReplayStore variant selection
//! 6. Property-based invariants

use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::*;
use crate::agent::PolicyFamily;
use crate::core::experience_buffer::{BufferConfig, ExperienceBuffer, OffPolicyBuffer, OnPolicyBuffer};
use crate::core::transition::{Action, Transition};
use crate::error::BufferError;

type B = NdArray<f32>;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn device() -> <B as Backend>::Device {
    Default::default()
}

/// Single-field transition whose state, reward and action all carry `label`.
fn labeled(label: usize) -> Transition {
    Transition::new(
        vec![label as f32],
        Action::Discrete(label as u32),
        label as f32,
        0.99,
    )
}

fn single_field_config(capacity: usize) -> BufferConfig {
    BufferConfig::new(capacity, 1, 1)
}

fn to_vec<const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor.into_data().convert::<f32>().to_vec::<f32>().unwrap()
}

fn sequential(capacity: usize) -> SequentialBuffer {
    SequentialBuffer::new(single_field_config(capacity)).unwrap()
}

fn circular(capacity: usize) -> CircularBuffer<B> {
    CircularBuffer::with_seed(single_field_config(capacity), &device(), 7).unwrap()
}

// =============================================================================
// CONSTRUCTION TESTS
// =============================================================================

mod construction_tests {
    use super::*;

    #[test]
    fn test_zero_capacity_fails_fast() {
        assert_eq!(
            SequentialBuffer::new(single_field_config(0)).unwrap_err(),
            BufferError::InvalidCapacity(0)
        );
        assert_eq!(
            CircularBuffer::<B>::new(single_field_config(0), &device()).unwrap_err(),
            BufferError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_zero_state_dim_fails_fast() {
        let err = SequentialBuffer::new(BufferConfig::new(8, 0, 1)).unwrap_err();
        assert!(matches!(err, BufferError::InvalidDimension { field: "state_dim", .. }));
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = sequential(4);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.write_cursor(), 0);
        assert_eq!(buffer.valid_length(), 0);
        assert!(!buffer.is_full());
        assert!(buffer.is_empty());
    }

    #[test]
    #[should_panic(expected = "state dimension mismatch")]
    fn test_append_wrong_state_dim_panics() {
        let mut buffer = sequential(4);
        buffer.append(&Transition::new(vec![1.0, 2.0], Action::Discrete(0), 0.0, 0.0));
    }
}

// =============================================================================
// CURSOR BOOKKEEPING TESTS
// =============================================================================

mod bookkeeping_tests {
    use super::*;

    #[test]
    fn test_pre_full_invariant() {
        let mut buffer = sequential(10);
        for i in 0..7 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        assert!(!buffer.is_full());
        assert_eq!(buffer.write_cursor(), 7);
        assert_eq!(buffer.valid_length(), 7);
    }

    #[test]
    fn test_wraparound_invariant() {
        let mut buffer = sequential(5);
        for i in 0..13 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        assert!(buffer.is_full());
        assert_eq!(buffer.write_cursor(), 13 % 5);
        assert_eq!(buffer.valid_length(), 5);
    }

    #[test]
    fn test_valid_length_waits_for_recompute() {
        let mut buffer = sequential(5);
        buffer.append(&labeled(0));
        buffer.append(&labeled(1));
        assert_eq!(buffer.valid_length(), 0, "appends alone do not draw a boundary");

        buffer.recompute_valid_length();
        assert_eq!(buffer.valid_length(), 2);

        buffer.append(&labeled(2));
        assert_eq!(buffer.valid_length(), 2);
    }

    #[test]
    fn test_exact_capacity_marks_full() {
        let mut buffer = sequential(3);
        for i in 0..3 {
            buffer.append(&labeled(i));
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.write_cursor(), 0);
    }

    #[test]
    fn test_concrete_scenario_sequential() {
        let mut buffer = sequential(5);
        for i in 0..7 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        assert_eq!(buffer.write_cursor(), 2);
        assert!(buffer.is_full());
        assert_eq!(buffer.valid_length(), 5);

        let slots: Vec<f32> = (0..5).map(|slot| buffer.state_at(slot)[0]).collect();
        assert_eq!(slots, vec![5.0, 6.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_concrete_scenario_circular() {
        let mut buffer = circular(5);
        for i in 0..7 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        assert_eq!(buffer.write_cursor(), 2);
        assert!(buffer.is_full());
        assert_eq!(buffer.valid_length(), 5);

        let slots: Vec<f32> = (0..5).map(|slot| buffer.state_at(slot).unwrap()[0]).collect();
        assert_eq!(slots, vec![5.0, 6.0, 2.0, 3.0, 4.0]);

        // reward and action columns follow the state
        assert_eq!(buffer.other_at(1).unwrap(), vec![6.0, 0.99, 6.0]);
    }

    #[test]
    fn test_reset_reuses_storage() {
        let mut buffer = sequential(4);
        for i in 0..6 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();
        buffer.reset();

        assert_eq!(buffer.write_cursor(), 0);
        assert_eq!(buffer.valid_length(), 0);
        assert!(!buffer.is_full());
        assert_eq!(buffer.capacity(), 4);

        buffer.append(&labeled(42));
        buffer.recompute_valid_length();
        assert_eq!(buffer.valid_length(), 1);
        assert_eq!(buffer.state_at(0), &[42.0]);
    }

    #[test]
    fn test_reset_discards_staged_circular_writes() {
        let mut buffer = circular(4);
        buffer.append(&labeled(1));
        buffer.append(&labeled(2));
        assert_eq!(buffer.staged_len(), 2);

        buffer.reset();
        assert_eq!(buffer.staged_len(), 0);
        buffer.recompute_valid_length();
        assert_eq!(buffer.valid_length(), 0);
        assert_eq!(buffer.state_at(0).unwrap(), vec![0.0]);
    }
}

// =============================================================================
// SEQUENTIAL READ TESTS
// =============================================================================

mod sequential_read_tests {
    use super::*;

    fn continuous_config() -> BufferConfig {
        BufferConfig::new(8, 2, 2).with_aux_dim(2)
    }

    fn continuous(i: usize, done: bool) -> Transition {
        Transition::from_step(
            vec![i as f32, -(i as f32)],
            Action::Continuous(vec![0.1 * i as f32, -0.1 * i as f32]),
            i as f32 * 10.0,
            done,
            0.9,
        )
        .with_aux(vec![-(i as f32), 1.0])
    }

    #[test]
    fn test_drain_all_projections() {
        let mut buffer = SequentialBuffer::new(continuous_config()).unwrap();
        buffer.append(&continuous(1, false));
        buffer.append(&continuous(2, true));
        buffer.recompute_valid_length();

        let batch = buffer.drain_all();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rewards, vec![10.0, 20.0]);
        assert_eq!(batch.masks, vec![0.9, 0.0]);
        assert_eq!(batch.actions, vec![0.1, -0.1, 0.2, -0.2]);
        assert_eq!(batch.aux, vec![-1.0, 1.0, -2.0, 1.0]);
        assert_eq!(batch.states, vec![1.0, -1.0, 2.0, -2.0]);
        assert_eq!(batch.state(1), &[2.0, -2.0]);
        assert_eq!(batch.action(0), &[0.1, -0.1]);
    }

    #[test]
    fn test_drain_all_only_sees_recomputed_rows() {
        let mut buffer = sequential(8);
        buffer.append(&labeled(0));
        buffer.recompute_valid_length();
        buffer.append(&labeled(1));

        let batch = buffer.drain_all();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.states, vec![0.0]);
    }

    #[test]
    fn test_drain_all_does_not_clear() {
        let mut buffer = sequential(8);
        buffer.append_all(&[labeled(0), labeled(1)]);
        buffer.recompute_valid_length();

        assert_eq!(buffer.drain_all().len(), 2);
        assert_eq!(buffer.drain_all().len(), 2);
        assert_eq!(buffer.valid_length(), 2);
    }

    #[test]
    fn test_drain_all_empty() {
        let buffer = sequential(8);
        let batch = buffer.drain_all();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_to_tensors_shapes() {
        let mut buffer = SequentialBuffer::new(continuous_config()).unwrap();
        for i in 0..3 {
            buffer.append(&continuous(i, i == 2));
        }
        buffer.recompute_valid_length();

        let tensors = buffer.drain_all().to_tensors::<B>(&device());
        assert_eq!(tensors.rewards.dims(), [3, 1]);
        assert_eq!(tensors.masks.dims(), [3, 1]);
        assert_eq!(tensors.actions.dims(), [3, 2]);
        assert_eq!(tensors.states.dims(), [3, 2]);
        assert_eq!(tensors.aux.as_ref().map(|t| t.dims()), Some([3, 2]));
        assert_eq!(to_vec(tensors.masks), vec![0.9, 0.9, 0.0]);
    }

    #[test]
    fn test_to_tensors_without_aux() {
        let mut buffer = sequential(4);
        buffer.append(&labeled(3));
        buffer.recompute_valid_length();

        let tensors = buffer.drain_all().to_tensors::<B>(&device());
        assert!(tensors.aux.is_none());
        assert_eq!(to_vec(tensors.actions), vec![3.0]);
    }
}

// =============================================================================
// CIRCULAR SAMPLING TESTS
// =============================================================================

mod circular_sampling_tests {
    use super::*;

    #[test]
    fn test_sample_needs_two_valid_rows() {
        let mut buffer = circular(8);
        assert!(buffer.sample(4).is_none());

        buffer.append(&labeled(0));
        buffer.recompute_valid_length();
        assert!(buffer.sample(4).is_none());

        buffer.append(&labeled(1));
        buffer.recompute_valid_length();
        let batch = buffer.sample(4).unwrap();
        assert_eq!(batch.indices, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_sample_zero_batch() {
        let mut buffer = circular(8);
        buffer.append_all(&[labeled(0), labeled(1), labeled(2)]);
        buffer.recompute_valid_length();
        assert!(buffer.sample(0).is_none());
    }

    #[test]
    fn test_sampling_bounds_exceed_batch() {
        let mut buffer = circular(16);
        for i in 0..6 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        // batch much larger than the valid range: replacement is required
        let batch = buffer.sample(500).unwrap();
        assert_eq!(batch.len(), 500);
        assert!(batch.indices.iter().all(|&i| i < 6 - 1));
    }

    #[test]
    fn test_sample_projections_match_slots() {
        let mut buffer = circular(16);
        for i in 0..10 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        let batch = buffer.sample(32).unwrap();
        assert_eq!(batch.rewards.dims(), [32, 1]);
        assert_eq!(batch.masks.dims(), [32, 1]);
        assert_eq!(batch.actions.dims(), [32, 1]);
        assert_eq!(batch.states.dims(), [32, 1]);

        let states = to_vec(batch.states);
        let next_states = to_vec(batch.next_states);
        let rewards = to_vec(batch.rewards);
        for (k, &idx) in batch.indices.iter().enumerate() {
            assert_eq!(states[k], idx as f32);
            assert_eq!(rewards[k], idx as f32);
            assert_eq!(next_states[k], (idx + 1) as f32);
        }
    }

    #[test]
    fn test_sample_ignores_writes_after_boundary() {
        let mut buffer = circular(16);
        buffer.append_all(&[labeled(0), labeled(1), labeled(2)]);
        buffer.recompute_valid_length();
        buffer.append_all(&[labeled(3), labeled(4)]);
        assert_eq!(buffer.staged_len(), 2);

        let batch = buffer.sample(200).unwrap();
        assert!(batch.indices.iter().all(|&i| i < 2));
        assert_eq!(buffer.state_at(3).unwrap(), vec![0.0]);

        buffer.recompute_valid_length();
        assert_eq!(buffer.staged_len(), 0);
        assert_eq!(buffer.state_at(3).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_staged_rows_larger_than_capacity() {
        let mut buffer = circular(3);
        for i in 0..8 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();

        let slots: Vec<f32> = (0..3).map(|s| buffer.state_at(s).unwrap()[0]).collect();
        assert_eq!(slots, vec![6.0, 7.0, 5.0]);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let fill = |buffer: &mut CircularBuffer<B>| {
            for i in 0..20 {
                buffer.append(&labeled(i));
            }
            buffer.recompute_valid_length();
        };
        let mut a = circular(32);
        let mut b = circular(32);
        fill(&mut a);
        fill(&mut b);

        assert_eq!(a.sample(16).unwrap().indices, b.sample(16).unwrap().indices);
    }

    /// Once wrapped, the slot just before the cursor is drawable and its
    /// successor is the oldest surviving row from an earlier rollout.
    #[test]
    fn test_wrap_boundary_pairs_across_rollouts() {
        let mut buffer = circular(4);
        // rollout A fills the ring
        for i in 0..4 {
            buffer.append(&labeled(i));
        }
        buffer.recompute_valid_length();
        // rollout B overwrites slots 0 and 1
        buffer.append(&labeled(100));
        buffer.append(&labeled(101));
        buffer.recompute_valid_length();

        assert_eq!(buffer.write_cursor(), 2);
        assert_eq!(buffer.valid_length(), 4);

        let batch = buffer.sample(1000).unwrap();
        assert!(batch.indices.iter().all(|&i| i < 3));
        assert!(batch.indices.contains(&1));

        let states = to_vec(batch.states);
        let next_states = to_vec(batch.next_states);
        for (k, &idx) in batch.indices.iter().enumerate() {
            if idx == 1 {
                assert_eq!(states[k], 101.0);
                assert_eq!(next_states[k], 2.0, "pairs rollout B's last row with rollout A");
            }
        }
    }
}

// =============================================================================
// REPLAY STORE TESTS
// =============================================================================

mod replay_store_tests {
    use super::*;

    #[test]
    fn test_family_selects_variant() {
        let on = ReplayStore::<B>::for_family(
            PolicyFamily::OnPolicy,
            single_field_config(4),
            &device(),
            0,
        )
        .unwrap();
        assert!(on.as_sequential().is_some());
        assert!(on.as_circular().is_none());
        assert_eq!(on.family(), PolicyFamily::OnPolicy);

        let off = ReplayStore::<B>::for_family(
            PolicyFamily::OffPolicy,
            single_field_config(4),
            &device(),
            0,
        )
        .unwrap();
        assert!(off.as_circular().is_some());
        assert_eq!(off.family(), PolicyFamily::OffPolicy);
    }

    #[test]
    fn test_store_delegates_bookkeeping() {
        let mut store = ReplayStore::<B>::for_family(
            PolicyFamily::OffPolicy,
            single_field_config(3),
            &device(),
            0,
        )
        .unwrap();
        for i in 0..4 {
            store.append(&labeled(i));
        }
        store.recompute_valid_length();
        assert!(store.is_full());
        assert_eq!(store.write_cursor(), 1);
        assert_eq!(store.valid_length(), 3);

        let batch = store.as_circular_mut().unwrap().sample(8).unwrap();
        assert!(batch.indices.iter().all(|&i| i < 2));

        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_config_propagates() {
        let err = ReplayStore::<B>::for_family(
            PolicyFamily::OnPolicy,
            BufferConfig::new(0, 1, 1),
            &device(),
            0,
        )
        .unwrap_err();
        assert_eq!(err, BufferError::InvalidCapacity(0));
    }
}

// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================

mod proptest_buffers {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: cursor, fullness and valid length follow the append count.
        #[test]
        fn test_bookkeeping_follows_append_count(capacity in 1usize..64, appends in 0usize..200) {
            let mut buffer = sequential(capacity);
            for i in 0..appends {
                buffer.append(&labeled(i));
            }
            buffer.recompute_valid_length();

            prop_assert_eq!(buffer.write_cursor(), appends % capacity);
            prop_assert_eq!(buffer.is_full(), appends >= capacity);
            let expected = if appends >= capacity { capacity } else { appends };
            prop_assert_eq!(buffer.valid_length(), expected);
        }

        /// Property: the newest `capacity` appends survive, each in slot `i % capacity`.
        #[test]
        fn test_newest_rows_survive(capacity in 1usize..32, appends in 1usize..100) {
            let mut buffer = sequential(capacity);
            for i in 0..appends {
                buffer.append(&labeled(i));
            }
            let first_surviving = appends.saturating_sub(capacity);
            for i in first_surviving..appends {
                prop_assert_eq!(buffer.state_at(i % capacity)[0], i as f32);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: sampled indices stay in [0, valid_length - 1).
        #[test]
        fn test_sample_indices_in_bounds(
            capacity in 2usize..32,
            appends in 2usize..80,
            batch_size in 1usize..128,
            seed in any::<u64>(),
        ) {
            let mut buffer = CircularBuffer::<B>::with_seed(single_field_config(capacity), &device(), seed).unwrap();
            for i in 0..appends {
                buffer.append(&labeled(i));
            }
            buffer.recompute_valid_length();

            let batch = buffer.sample(batch_size).unwrap();
            let valid = buffer.valid_length();
            prop_assert_eq!(batch.len(), batch_size);
            prop_assert!(batch.indices.iter().all(|&i| i < valid - 1));
        }
    }
}
