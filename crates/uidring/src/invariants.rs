//! Debug assertion macros for generator and ring buffer invariants.
//!
//! Only active in debug builds (`debug_assert!`), so there is zero overhead
//! in release builds.

/// Assert that a field value fits the width the allocator was built with.
///
/// Out-of-range arguments to `allocate` silently corrupt adjacent fields;
/// callers are required to pre-validate, this catches the ones that don't.
macro_rules! debug_assert_field_in_range {
    ($name:literal, $value:expr, $max:expr) => {
        debug_assert!(
            (0..=$max).contains(&$value),
            "{} = {} outside [0, {}], would corrupt adjacent fields",
            $name,
            $value,
            $max
        )
    };
}

/// Assert that the cursor never moves past the tail.
///
/// Holds unconditionally because the consumer advances the cursor with a
/// conditional `fetch_update` that refuses to pass the tail.
macro_rules! debug_assert_cursor_not_past_tail {
    ($cursor:expr, $tail:expr) => {
        debug_assert!(
            $cursor <= $tail,
            "cursor {} moved past tail {}",
            $cursor,
            $tail
        )
    };
}

/// Assert that occupancy never exceeds the buffer size.
macro_rules! debug_assert_bounded_occupancy {
    ($tail:expr, $cursor:expr, $size:expr) => {
        debug_assert!(
            $tail - $cursor <= $size as i64,
            "occupancy {} exceeds buffer size {}",
            $tail - $cursor,
            $size
        )
    };
}

pub(crate) use debug_assert_bounded_occupancy;
pub(crate) use debug_assert_cursor_not_past_tail;
pub(crate) use debug_assert_field_in_range;
