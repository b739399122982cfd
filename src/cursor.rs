/// Index of the record currently being read.
///
/// `floor(progress * record_count)` clamped to the last record. `None` only
/// for an empty collection; non-finite progress reads as the first record.
pub fn current_index(progress: f64, record_count: usize) -> Option<usize> {
    if record_count == 0 {
        return None;
    }
    let last = record_count - 1;
    if !progress.is_finite() || progress <= 0.0 {
        return Some(0);
    }
    let raw = (progress * record_count as f64).floor();
    if raw >= last as f64 {
        return Some(last);
    }
    Some(raw as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds_and_is_monotonic() {
        for n in [1usize, 2, 3, 7, 100, 150, 1189] {
            let mut previous = 0usize;
            for step in 0..=1000 {
                let p = step as f64 / 1000.0;
                let idx = current_index(p, n).expect("non-empty");
                assert!(idx < n, "p={p} n={n} idx={idx}");
                assert!(idx >= previous, "not monotonic at p={p} n={n}");
                previous = idx;
            }
            assert_eq!(previous, n - 1);
        }
    }

    #[test]
    fn half_way_through_hundred_is_record_fifty() {
        assert_eq!(current_index(0.5, 100), Some(50));
        assert_eq!(current_index(0.0, 100), Some(0));
        assert_eq!(current_index(1.0, 100), Some(99));
    }

    #[test]
    fn transient_overshoot_is_clamped() {
        assert_eq!(current_index(1.0000001, 10), Some(9));
        assert_eq!(current_index(-0.0001, 10), Some(0));
        assert_eq!(current_index(f64::NAN, 10), Some(0));
        assert_eq!(current_index(f64::INFINITY, 10), Some(0));
    }

    #[test]
    fn empty_collection_has_no_record() {
        assert_eq!(current_index(0.3, 0), None);
    }
}
