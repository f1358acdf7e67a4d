use super::key::{HumusAreaMap, RateTable};

fn round_10(x: f64) -> f64 {
    (x * 1e10).round() / 1e10
}

/// Continuous strategy: factors linear in humus, zero area-weighted mean
///
/// The lowest humus value gets `+max_range` and the highest `-max_range`
/// before the whole table is shifted so that the area-weighted mean factor
/// is zero. Factors are rounded to ten decimals.
pub fn distribute_stepless(map: &HumusAreaMap, max_range: f64) -> RateTable {
    let mut table = RateTable::new();
    let entries: Vec<_> = map.with_data().collect();

    match entries.as_slice() {
        [] => {}
        [(key, _)] => table.insert(*key, 0.0),
        [(first, _), .., (last, _)] => {
            let min = first.value();
            let range = last.value() - min;

            let base: Vec<f64> = entries
                .iter()
                .map(|(key, _)| {
                    let ratio = (key.value() - min) / range;
                    max_range - 2.0 * max_range * ratio
                })
                .collect();

            let total_area: f64 = entries.iter().map(|(_, area)| area).sum();
            let weighted_mean: f64 = if total_area > 0.0 {
                entries
                    .iter()
                    .zip(&base)
                    .map(|((_, area), w)| w * area / total_area)
                    .sum()
            } else {
                base.iter().sum::<f64>() / base.len() as f64
            };

            for ((key, _), w) in entries.iter().zip(&base) {
                table.insert(*key, round_10(w - weighted_mean));
            }
        }
    }

    if map.contains_no_data() {
        table.mark_no_data();
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_values_symmetric() {
        let map: HumusAreaMap = vec![(20.0, 100.0), (80.0, 100.0)].into_iter().collect();
        let table = distribute_stepless(&map, 0.3);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(20.0), Some(0.3));
        assert_eq!(table.get(80.0), Some(-0.3));
        assert_eq!(table.get(0.0), None);
    }

    #[test]
    fn test_degenerate_maps() {
        assert!(distribute_stepless(&HumusAreaMap::new(), 0.2).is_empty());

        let zeros: HumusAreaMap = vec![(0.0, 10.0)].into_iter().collect();
        let table = distribute_stepless(&zeros, 0.2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0.0), Some(-1.0));

        let single: HumusAreaMap = vec![(0.0, 10.0), (35.0, 90.0)].into_iter().collect();
        let table = distribute_stepless(&single, 0.2);
        assert_eq!(table.get(35.0), Some(0.0));
        assert_eq!(table.get(0.0), Some(-1.0));
    }

    #[test]
    fn test_weighted_sum_is_zero() {
        let map: HumusAreaMap = vec![
            (0.0, 400.0),
            (21.3, 150.0),
            (24.8, 620.0),
            (30.1, 75.5),
            (33.0, 310.0),
            (47.9, 12.0),
        ]
        .into_iter()
        .collect();
        let table = distribute_stepless(&map, 0.2);

        let data: Vec<_> = map.with_data().collect();
        let total: f64 = data.iter().map(|(_, a)| a).sum();
        let weighted: f64 = data
            .iter()
            .map(|(k, a)| table.get(k.value()).unwrap() * a / total)
            .sum();

        assert!(weighted.abs() < 1e-9);
        assert_eq!(table.get(0.0), Some(-1.0));
        // Shifting keeps the spread of the linear weights
        let spread = table.get(21.3).unwrap() - table.get(47.9).unwrap();
        assert!((spread - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_factors_decrease_with_humus() {
        let map: HumusAreaMap = (1..=10).map(|i| (i as f64 * 3.5, 50.0 + i as f64)).collect();
        let table = distribute_stepless(&map, 0.15);

        let factors: Vec<f64> = table.iter().map(|(_, f)| f).collect();
        assert!(factors.windows(2).all(|w| w[0] > w[1]));
    }
}
