//! Property-based tests over the bit layout and the ring buffer.
//!
//! Coverage:
//! - Pack/unpack round-trip for every in-range field triple
//! - Monotone packing in each field
//! - Ring occupancy and cursor bounds under arbitrary put/take traffic

use proptest::prelude::*;
use uidring::{next_power_of_two, BitsAllocator, RingBuffer, UidError};

const TIME_BITS: u32 = 28;
const WORKER_BITS: u32 = 22;
const SEQ_BITS: u32 = 13;

fn allocator() -> BitsAllocator {
    BitsAllocator::new(TIME_BITS, WORKER_BITS, SEQ_BITS).unwrap()
}

proptest! {
    /// Packing then parsing restores every field exactly.
    #[test]
    fn prop_pack_unpack_roundtrip(
        delta in 0_i64..(1 << TIME_BITS),
        worker in 0_i64..(1 << WORKER_BITS),
        seq in 0_i64..(1 << SEQ_BITS),
    ) {
        let allocator = allocator();
        let uid = allocator.allocate(delta, worker, seq);

        prop_assert!(uid >= 0, "sign bit leaked into uid {uid}");
        prop_assert_eq!(allocator.parse(uid), (delta, worker, seq));
    }

    /// For a fixed delta and worker, ordering follows the sequence; for a
    /// fixed worker and sequence, ordering follows the delta.
    #[test]
    fn prop_monotone_packing(
        delta_a in 0_i64..(1 << TIME_BITS),
        delta_b in 0_i64..(1 << TIME_BITS),
        worker in 0_i64..(1 << WORKER_BITS),
        seq_a in 0_i64..(1 << SEQ_BITS),
        seq_b in 0_i64..(1 << SEQ_BITS),
    ) {
        let allocator = allocator();

        let by_seq_a = allocator.allocate(delta_a, worker, seq_a);
        let by_seq_b = allocator.allocate(delta_a, worker, seq_b);
        prop_assert_eq!(by_seq_a < by_seq_b, seq_a < seq_b);

        let by_delta_a = allocator.allocate(delta_a, worker, seq_a);
        let by_delta_b = allocator.allocate(delta_b, worker, seq_a);
        prop_assert_eq!(by_delta_a < by_delta_b, delta_a < delta_b);
    }

    /// Occupancy stays within the buffer size and the cursor never passes
    /// the tail, whatever the traffic pattern.
    #[test]
    fn prop_ring_bounds_under_traffic(ops in proptest::collection::vec(any::<bool>(), 0..400)) {
        let ring = RingBuffer::new(32, 50).unwrap();
        let size = ring.buffer_size() as i64;
        let mut next_uid = 0_i64;
        let mut expected = std::collections::VecDeque::new();

        for is_put in ops {
            if is_put {
                if ring.put(next_uid) {
                    expected.push_back(next_uid);
                }
                next_uid += 1;
            } else {
                match ring.take() {
                    Ok(uid) => prop_assert_eq!(Some(uid), expected.pop_front()),
                    Err(err) => {
                        prop_assert_eq!(err, UidError::BufferEmpty);
                        prop_assert!(expected.is_empty());
                    }
                }
            }

            prop_assert!(ring.cursor() <= ring.tail());
            prop_assert!(ring.tail() - ring.cursor() <= size);
            prop_assert!(ring.len() <= ring.buffer_size());
        }
    }

    /// Rounding up to a power of two is idempotent and never shrinks.
    #[test]
    fn prop_next_power_of_two(n in 0_usize..(1 << 20)) {
        let rounded = next_power_of_two(n);
        prop_assert!(rounded.is_power_of_two());
        prop_assert!(rounded >= n.max(1));
        prop_assert_eq!(next_power_of_two(rounded), rounded);
    }
}

#[test]
fn next_power_of_two_table() {
    for (input, expected) in [(1, 1), (2, 2), (3, 4), (5, 8), (16, 16), (17, 32)] {
        assert_eq!(next_power_of_two(input), expected, "input {input}");
    }
}
