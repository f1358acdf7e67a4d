use super::key::{HumusAreaMap, RateTable};

/// Slack on interval boundary comparisons so that accumulated shares
/// landing exactly on a boundary do not spill into the next interval.
const BOUNDARY_EPS: f64 = 1e-12;

/// Discrete strategy: area quantiles mapped onto a fixed set of factors
///
/// The non-zero humus values are walked in ascending order and their area
/// shares stacked on `[0, 1]`, which is split into `factors.len()` equal
/// intervals. A value that lies inside one interval gets that interval's
/// factor; one that straddles several gets the share-weighted blend.
/// The no-data key always maps to -1.
pub fn distribute_steps(map: &HumusAreaMap, factors: &[f64]) -> RateTable {
    let mut table = RateTable::new();

    let (keys, areas): (Vec<_>, Vec<_>) = map.with_data().unzip();
    let blended = redistribute_factor(&areas, factors);

    for (key, factor) in keys.into_iter().zip(blended) {
        table.insert(key, factor);
    }
    table.mark_no_data();
    table
}

/// Blend `factors` over consecutive area shares
///
/// Returns one factor per entry of `areas`. An empty input on either side
/// gives an empty result. If the areas sum to zero every entry is treated
/// as an equal share.
pub fn redistribute_factor(areas: &[f64], factors: &[f64]) -> Vec<f64> {
    if areas.is_empty() || factors.is_empty() {
        return Vec::new();
    }

    let k = factors.len();
    let interval = 1.0 / k as f64;
    let total: f64 = areas.iter().sum();
    let last = areas.len() - 1;

    let mut boundary = interval;
    let mut index = 0;
    let mut assigned = 0.0;
    let mut cumulative = 0.0;
    let mut result = Vec::with_capacity(areas.len());

    for (i, &area) in areas.iter().enumerate() {
        let share = if total > 0.0 {
            area / total
        } else {
            1.0 / areas.len() as f64
        };
        cumulative = if i == last { 1.0 } else { cumulative + share };

        if share <= 0.0 {
            result.push(factors[index]);
            continue;
        }

        if cumulative <= boundary + BOUNDARY_EPS {
            assigned = cumulative;
            result.push(factors[index]);
            continue;
        }

        let mut factor = 0.0;
        while cumulative > boundary + BOUNDARY_EPS && index < k - 1 {
            factor += factors[index] * (boundary - assigned) / share;
            assigned = boundary;
            index += 1;
            boundary += interval;
        }
        factor += factors[index] * (cumulative - assigned) / share;
        assigned = cumulative;
        result.push(factor);
    }

    result
}
