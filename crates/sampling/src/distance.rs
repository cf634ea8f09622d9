use crate::device::Device;
use rayon::prelude::*;

/// Squared Euclidean distance between two points.
///
/// Finite inputs never produce NaN; the worst case for very large
/// coordinates is +inf, which still orders correctly under max selection.
#[inline]
pub fn dist_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Lower every table entry to `min(entry, dist_sq(point, pivot))`.
///
/// The update is elementwise, so the parallel path partitions the table
/// without any cross-element ordering and matches the sequential path
/// bit for bit.
pub fn update_min_dists(table: &mut [f32], points: &[[f32; 3]], pivot: [f32; 3], device: Device) {
    debug_assert_eq!(table.len(), points.len());

    match device {
        Device::Sequential => {
            for (slot, point) in table.iter_mut().zip(points) {
                let d = dist_sq(*point, pivot);
                if d < *slot {
                    *slot = d;
                }
            }
        }
        Device::Parallel => {
            table
                .par_iter_mut()
                .zip(points.par_iter())
                .for_each(|(slot, point)| {
                    let d = dist_sq(*point, pivot);
                    if d < *slot {
                        *slot = d;
                    }
                });
        }
    }
}

/// Index of the maximum table entry, preferring the lowest index on ties.
///
/// The parallel reduction orders candidates by `(value desc, index asc)`,
/// which is associative and commutative, so the result does not depend on
/// how rayon splits the slice.
///
/// # Panics
///
/// Panics if the table is empty.
pub fn arg_max(table: &[f32], device: Device) -> usize {
    assert!(!table.is_empty(), "arg_max over empty table");

    match device {
        Device::Sequential => {
            let mut best = 0;
            for i in 1..table.len() {
                if table[i] > table[best] {
                    best = i;
                }
            }
            best
        }
        Device::Parallel => {
            table
                .par_iter()
                .enumerate()
                .reduce_with(|a, b| {
                    if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
                        b
                    } else {
                        a
                    }
                })
                .map(|(i, _)| i)
                .unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{arg_max, dist_sq, update_min_dists};
    use crate::device::Device;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn dist_sq_matches_hand_computation() {
        assert_abs_diff_eq!(dist_sq([0.0, 0.0, 0.0], [1.0, 2.0, 2.0]), 9.0);
        assert_abs_diff_eq!(dist_sq([-1.0, 0.0, 3.0], [-1.0, 0.0, 3.0]), 0.0);
        assert_abs_diff_eq!(dist_sq([1.0, 1.0, 1.0], [2.0, 2.0, 2.0]), 3.0);
    }

    #[test]
    fn dist_sq_is_symmetric() {
        let a = [1.5, -2.25, 0.75];
        let b = [-4.0, 0.5, 9.0];
        assert_eq!(dist_sq(a, b), dist_sq(b, a));
    }

    #[test]
    fn update_lowers_entries_monotonically() {
        let points = vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 4.0, 0.0]];
        let mut table = vec![f32::INFINITY; 3];

        update_min_dists(&mut table, &points, [0.0, 0.0, 0.0], Device::Sequential);
        assert_eq!(table, vec![0.0, 9.0, 16.0]);

        let before = table.clone();
        update_min_dists(&mut table, &points, [3.0, 0.0, 0.0], Device::Sequential);
        for (new, old) in table.iter().zip(&before) {
            assert!(new <= old, "table entry increased: {} -> {}", old, new);
        }
        assert_eq!(table, vec![0.0, 0.0, 16.0]);
    }

    #[test]
    fn arg_max_prefers_lowest_index_on_tie() {
        let table = vec![1.0, 5.0, 5.0, 2.0];
        assert_eq!(arg_max(&table, Device::Sequential), 1);
        assert_eq!(arg_max(&table, Device::Parallel), 1);
    }

    #[test]
    fn arg_max_handles_infinities() {
        let table = vec![f32::INFINITY, 3.0, f32::INFINITY];
        assert_eq!(arg_max(&table, Device::Sequential), 0);
        assert_eq!(arg_max(&table, Device::Parallel), 0);
    }

    #[test]
    fn arg_max_single_entry() {
        assert_eq!(arg_max(&[0.5], Device::Sequential), 0);
        assert_eq!(arg_max(&[0.5], Device::Parallel), 0);
    }

    proptest! {
        #[test]
        fn parallel_update_matches_sequential(
            pts in prop::collection::vec((-100.0f32..100.0f32, -100.0f32..100.0f32, -100.0f32..100.0f32), 1..500),
            pivot in (-100.0f32..100.0f32, -100.0f32..100.0f32, -100.0f32..100.0f32),
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let pivot = [pivot.0, pivot.1, pivot.2];

            let mut seq = vec![f32::INFINITY; points.len()];
            let mut par = seq.clone();
            update_min_dists(&mut seq, &points, pivot, Device::Sequential);
            update_min_dists(&mut par, &points, pivot, Device::Parallel);

            prop_assert_eq!(seq, par);
        }

        #[test]
        fn parallel_arg_max_matches_sequential(
            table in prop::collection::vec(0.0f32..1000.0f32, 1..500),
        ) {
            prop_assert_eq!(
                arg_max(&table, Device::Sequential),
                arg_max(&table, Device::Parallel)
            );
        }

        #[test]
        fn dist_sq_never_nan_for_finite_inputs(
            a in (-1e6f32..1e6f32, -1e6f32..1e6f32, -1e6f32..1e6f32),
            b in (-1e6f32..1e6f32, -1e6f32..1e6f32, -1e6f32..1e6f32),
        ) {
            let d = dist_sq([a.0, a.1, a.2], [b.0, b.1, b.2]);
            prop_assert!(!d.is_nan());
            prop_assert!(d >= 0.0);
        }
    }
}
