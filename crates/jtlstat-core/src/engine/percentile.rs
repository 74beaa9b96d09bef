//! Top-weighted percentile over a retained sample list.
//!
//! The P-th percentile is the k-th *largest* value, where
//! `k = ceil(len * (100 - P) / 100)`. This counts from the slow end of the
//! distribution and is not the conventional rank-from-bottom percentile.

/// Sort `values` in descending order, in place.
pub fn sort_descending(values: &mut [u64]) {
    values.sort_unstable_by(|a, b| b.cmp(a));
}

/// Percentile `p` of an already descending-sorted slice.
///
/// Returns `None` when the rank rounds to zero (`p >= 100`, or an empty
/// slice).
pub fn percentile_desc(sorted_desc: &[u64], p: f64) -> Option<u64> {
    let divisor = (100.0 - p) / 100.0;
    let k = (sorted_desc.len() as f64 * divisor).ceil();
    if k.is_nan() || k < 1.0 {
        return None;
    }
    let k = (k as usize).min(sorted_desc.len());
    sorted_desc.get(k - 1).copied()
}

/// Convenience for unsorted input; sorts a copy.
pub fn percentile(values: &[u64], p: f64) -> Option<u64> {
    let mut sorted = values.to_vec();
    sort_descending(&mut sorted);
    percentile_desc(&sorted, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct recomputation of the definition, independent of the helpers.
    fn kth_largest(values: &[u64], p: f64) -> Option<u64> {
        let mut v = values.to_vec();
        v.sort();
        v.reverse();
        let k = (v.len() as f64 * (100.0 - p) / 100.0).ceil() as usize;
        v.into_iter().take(k).last()
    }

    #[test]
    fn ten_values() {
        let values = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        // k = ceil(10 * 0.5) = 5 -> 5th largest
        assert_eq!(percentile(&values, 50.0), Some(60));
        // k = ceil(10 * 0.1) = 1 -> largest
        assert_eq!(percentile(&values, 90.0), Some(100));
        // k = ceil(10 * 0.01) = 1
        assert_eq!(percentile(&values, 99.0), Some(100));
    }

    #[test]
    fn matches_definition_on_hand_built_sequence() {
        let values = [
            120, 5, 980, 300, 301, 42, 42, 610, 75, 1500, 220, 18, 999, 64, 430, 87, 250,
        ];
        for p in [0.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0] {
            assert_eq!(percentile(&values, p), kth_largest(&values, p), "p = {p}");
        }
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = [10u64, 50, 100, 200, 500];
        let b = [500u64, 200, 100, 50, 10];
        for p in [50.0, 90.0, 99.0] {
            assert_eq!(percentile(&a, p), percentile(&b, p));
        }
    }

    #[test]
    fn single_value() {
        assert_eq!(percentile(&[250], 50.0), Some(250));
        assert_eq!(percentile(&[250], 99.0), Some(250));
    }

    #[test]
    fn p100_has_no_data() {
        assert_eq!(percentile(&[1, 2, 3], 100.0), None);
    }

    #[test]
    fn empty_has_no_data() {
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn p0_is_smallest() {
        assert_eq!(percentile(&[7, 3, 9], 0.0), Some(3));
    }

    #[test]
    fn top_weighting_can_invert_order() {
        // p50 picks the 2nd largest of 3, p90 and p99 the largest.
        let values = [100, 200, 300];
        assert_eq!(percentile(&values, 50.0), Some(200));
        assert_eq!(percentile(&values, 90.0), Some(300));
        assert_eq!(percentile(&values, 99.0), Some(300));
    }

    #[test]
    fn sort_descending_in_place() {
        let mut v = vec![3, 1, 2];
        sort_descending(&mut v);
        assert_eq!(v, vec![3, 2, 1]);
    }
}
