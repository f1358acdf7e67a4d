//! Cell-count checks for generated grids
//!
//! The engine itself puts no upper bound on the number of cells. Callers that
//! need one pass `max_cells`; oversize grids are then rejected before a single
//! cell is built. Fine but acceptable grids only produce a warning.

use tracing::warn;

use crate::error::{Result, VfmError};

/// Cell count from which building the map gets noticeably slow
pub const FINE_GRID_CELLS: usize = 1000;

/// Shape of a generated grid plus anything worth telling the user
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshReport {
    pub rows: usize,
    pub columns: usize,
    /// Warning messages for issues found
    pub warnings: Vec<String>,
}

impl MeshReport {
    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} cells ({} rows x {} columns)",
            self.cell_count(),
            self.rows,
            self.columns
        )
    }
}

/// Check grid dimensions against an optional limit
pub fn check_grid(rows: usize, columns: usize, max_cells: Option<usize>) -> Result<MeshReport> {
    let mut report = MeshReport {
        rows,
        columns,
        ..Default::default()
    };
    let cells = report.cell_count();

    if let Some(limit) = max_cells
        && cells > limit
    {
        return Err(VfmError::MeshTooLarge { cells, limit });
    }

    if cells >= FINE_GRID_CELLS {
        let message = format!(
            "grid has {} cells; building the map may take a while",
            cells
        );
        warn!("{}", message);
        report.warnings.push(message);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_grid_passes_clean() {
        let report = check_grid(5, 4, Some(2000)).unwrap();
        assert_eq!(report.cell_count(), 20);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_fine_grid_warns() {
        let report = check_grid(40, 30, Some(2000)).unwrap();
        assert_eq!(report.cell_count(), 1200);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_limit_rejects_oversize_grid() {
        let result = check_grid(50, 50, Some(2000));
        assert!(matches!(
            result,
            Err(VfmError::MeshTooLarge {
                cells: 2500,
                limit: 2000
            })
        ));
    }

    #[test]
    fn test_no_limit_accepts_anything() {
        assert!(check_grid(100, 100, None).is_ok());
    }
}
