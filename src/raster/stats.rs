use thiserror::Error;

use super::window::RasterWindow;

/// Mean and standard deviation of a raster window, rounded to integers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumusStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Why [`humus_stats`] could not produce a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsUnavailable {
    #[error("raster window has no non-zero values")]
    NoValidValues,
    #[error("raster statistics are not finite")]
    NotFinite,
}

/// Statistics over the finite, non-zero samples of `window`
pub fn humus_stats(window: &RasterWindow) -> Result<HumusStats, StatsUnavailable> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for &v in &window.values {
        if v == 0.0 || !v.is_finite() {
            continue;
        }
        count += 1;
        sum += v;
        sum_sq += v * v;
    }

    if count == 0 {
        return Err(StatsUnavailable::NoValidValues);
    }

    let mean = sum / count as f64;
    let variance = sum_sq / count as f64 - mean * mean;

    // Cancellation can push a zero variance slightly negative
    let variance = if variance < 0.0 && variance > -1e-9 * mean * mean {
        0.0
    } else {
        variance
    };

    if !mean.is_finite() || !(variance >= 0.0) {
        return Err(StatsUnavailable::NotFinite);
    }

    let std_dev = variance.sqrt();
    if !std_dev.is_finite() {
        return Err(StatsUnavailable::NotFinite);
    }

    Ok(HumusStats {
        mean: mean.round(),
        std_dev: std_dev.round(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_skip_zero_and_nan() {
        let window = RasterWindow::new(3, 2, vec![40.0, 0.0, 60.0, f64::NAN, 0.0, 50.0]);
        let stats = humus_stats(&window).unwrap();

        assert_eq!(stats.mean, 50.0);
        // population std-dev of 40, 60, 50 is 8.16
        assert_eq!(stats.std_dev, 8.0);
    }

    #[test]
    fn test_stats_constant_window() {
        let window = RasterWindow::new(2, 2, vec![33.3; 4]);
        let stats = humus_stats(&window).unwrap();

        assert_eq!(stats.mean, 33.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_stats_all_zero() {
        let window = RasterWindow::new(2, 1, vec![0.0, 0.0]);
        assert_eq!(humus_stats(&window), Err(StatsUnavailable::NoValidValues));

        let empty = RasterWindow::new(0, 0, Vec::new());
        assert_eq!(humus_stats(&empty), Err(StatsUnavailable::NoValidValues));
    }

    #[test]
    fn test_stats_overflow_is_not_finite() {
        let window = RasterWindow::new(2, 1, vec![f64::MAX, f64::MAX]);
        assert_eq!(humus_stats(&window), Err(StatsUnavailable::NotFinite));
    }
}
