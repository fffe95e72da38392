use atlas_packer_core::prelude::*;
use rand::{Rng, SeedableRng};

/// Drives `search` towards the smallest value `fits` accepts. Returns (best, candidates), where
/// `best` is the smallest accepted candidate, starting from `known_good`.
fn smallest_accepted(
    search: &mut BinarySearch,
    known_good: u32,
    mut fits: impl FnMut(u32) -> bool,
) -> (u32, Vec<u32>) {
    let mut seen = Vec::new();
    let mut best = known_good;
    let mut candidate = Some(search.reset());
    while let Some(v) = candidate {
        seen.push(v);
        assert!(seen.len() <= 128, "search did not terminate: {:?}", seen);
        let ok = fits(v);
        if ok {
            best = best.min(v);
        }
        candidate = search.next(!ok);
    }
    (best, seen)
}

fn bit_len(v: u32) -> usize {
    (32 - v.leading_zeros()) as usize
}

#[test]
fn finds_threshold_within_one_step() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let min = rng.gen_range(0..2000u32);
        let max = rng.gen_range(min..4000u32);
        let threshold = rng.gen_range(min..=max);
        let mut search = BinarySearch::new(min, max, 0, false, false);
        let (best, seen) = smallest_accepted(&mut search, max, |v| v >= threshold);
        // The last bracket value is never proposed, so the answer may sit one above.
        assert!(best >= threshold, "min={min} max={max}");
        assert!(best - threshold <= 1, "{best} vs {threshold}");
        assert!(seen.iter().all(|v| (min..=max).contains(v)), "{:?}", seen);
        assert!(seen.len() <= bit_len(max - min) + 1, "{} steps", seen.len());
    }
}

#[test]
fn stops_when_one_value_is_left() {
    let mut search = BinarySearch::new(0, 2, 0, false, false);
    assert_eq!(search.reset(), 1);
    // low == high == 2
    assert_eq!(search.next(true), None);

    assert_eq!(search.reset(), 1);
    // low == high == 0
    assert_eq!(search.next(false), None);
}

#[test]
fn stops_when_bracket_is_within_fuzziness() {
    let mut search = BinarySearch::new(0, 100, 10, false, false);
    assert_eq!(search.reset(), 50);
    assert_eq!(search.next(false), Some(24));
    assert_eq!(search.next(false), Some(11));
    // [0, 10] is within tolerance
    assert_eq!(search.next(false), None);
}

#[test]
fn feeding_the_predicate_directly_finds_the_largest_passing_value() {
    let mut search = BinarySearch::new(0, 100, 0, false, false);
    let mut best = None;
    let mut candidate = Some(search.reset());
    while let Some(v) = candidate {
        let ok = v <= 37;
        if ok {
            best = Some(v);
        }
        candidate = search.next(ok);
    }
    assert_eq!(best, Some(37));
}

#[test]
fn single_value_range() {
    let mut search = BinarySearch::new(42, 42, 0, false, false);
    assert_eq!(search.reset(), 42);
    assert_eq!(search.next(true), None);
    assert_eq!(search.reset(), 42);
    assert_eq!(search.next(false), None);
}

#[test]
fn reset_restarts_the_search() {
    let mut search = BinarySearch::new(0, 64, 0, false, false);
    assert_eq!(search.reset(), 32);
    assert_eq!(search.next(true), Some(48));
    assert_eq!(search.reset(), 32);
    assert_eq!(search.next(false), Some(15));
}

#[test]
fn pot_candidates_are_powers_of_two_within_bounds() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let min = rng.gen_range(1..1500u32);
        let max = rng.gen_range(min..5000u32);
        let lo = min.next_power_of_two();
        let hi = max.next_power_of_two();
        let threshold = rng.gen_range(min..=max);
        let mut search = BinarySearch::new(min, max, 25, true, false);
        let first = search.reset();
        assert!(first.is_power_of_two());
        assert!(first >= lo && first <= hi, "{first} not in [{lo}, {hi}]");
        let (best, seen) = smallest_accepted(&mut search, hi, |v| v >= threshold);
        assert!(seen.iter().all(|v| v.is_power_of_two() && *v >= lo && *v <= hi));
        // Exponent space is searched exhaustively.
        assert_eq!(best, threshold.next_power_of_two().max(lo));
    }
}

#[test]
fn pot_example_sequence() {
    // Exponents 5..=7 -> first candidate 2^6.
    let mut search = BinarySearch::new(17, 100, 0, true, false);
    assert_eq!(search.reset(), 64);
    assert_eq!(search.next(true), Some(128));
    assert_eq!(search.next(true), None);
}

#[test]
fn pot_ignores_fuzziness() {
    let mut exact = BinarySearch::new(1, 4096, 0, true, false);
    let mut fuzzy = BinarySearch::new(1, 4096, 1000, true, false);
    let (a, seen_a) = smallest_accepted(&mut exact, 4096, |v| v >= 300);
    let (b, seen_b) = smallest_accepted(&mut fuzzy, 4096, |v| v >= 300);
    assert_eq!(a, 512);
    assert_eq!(a, b);
    assert_eq!(seen_a, seen_b);
}

#[test]
fn mod4_candidates_are_multiples_of_four() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(13);
    for _ in 0..200 {
        let min = rng.gen_range(0..1000u32);
        let max = rng.gen_range(min..3000u32);
        let threshold = rng.gen_range(min..=max);
        let mut search = BinarySearch::new(min, max, 0, false, true);
        let lo = min.div_ceil(4) * 4;
        let hi = max.div_ceil(4) * 4;
        let (best, seen) = smallest_accepted(&mut search, hi, |v| v >= threshold);
        assert!(seen.iter().all(|v| v % 4 == 0), "{:?}", seen);
        assert!(seen.iter().all(|v| *v >= lo && *v <= hi));
        assert_eq!(best % 4, 0);
        assert!(best >= threshold);
        assert!(best <= threshold.div_ceil(4) * 4 + 4, "{best} vs {threshold}");
    }
}

#[test]
fn fuzziness_stops_early_within_tolerance() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(17);
    let fuzz = 10;
    for _ in 0..300 {
        let threshold = rng.gen_range(0..=1000u32);
        let mut fuzzy = BinarySearch::new(0, 1000, fuzz, false, false);
        let mut exact = BinarySearch::new(0, 1000, 0, false, false);
        let (chosen, seen) = smallest_accepted(&mut fuzzy, 1000, |v| v >= threshold);
        let (_, seen_exact) = smallest_accepted(&mut exact, 1000, |v| v >= threshold);
        assert!(chosen >= threshold);
        assert!(chosen - threshold <= fuzz + 1, "{chosen} vs {threshold}");
        assert!(seen.len() <= seen_exact.len());
    }
}
