//! Reduction of a thermal frame to a single yaw offset.
//!
//! The extractor finds the hottest cell, gates it against the calibrated
//! hotspot threshold, then computes an intensity-weighted horizontal
//! centroid over a small window around the peak so one noisy pixel can't
//! steer the turret. The column-space result maps to degrees through the
//! sensor's horizontal field of view, centered on the optical axis.

use crate::config::{ConfigError, ThermalConfig};
use crate::thermal::ThermalFrame;

/// Where the target appears to be, horizontally.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetEstimate {
    /// Signed yaw offset from the optical axis (degrees).
    pub angle_offset_deg: f32,
    /// True when a cell cleared the hotspot threshold.
    pub hotspot: bool,
}

impl TargetEstimate {
    /// The no-target sentinel: zero offset, no confidence.
    pub const NONE: Self = Self {
        angle_offset_deg: 0.0,
        hotspot: false,
    };
}

/// Stateful hotspot/centroid extractor.
///
/// Keeps only the previous peak column, used to resolve ties between equal
/// maxima toward the last estimate and damp oscillation.
pub struct CentroidExtractor {
    threshold_c: f32,
    fov_deg: f32,
    window_radius: usize,
    prev_col: Option<f32>,
}

impl CentroidExtractor {
    /// Create an extractor from the thermal calibration.
    pub fn new(cfg: &ThermalConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            threshold_c: cfg.hotspot_threshold_c,
            fov_deg: cfg.fov_deg,
            window_radius: cfg.window_radius,
            prev_col: None,
        })
    }

    /// Reduce a frame to a target estimate.
    ///
    /// Below-threshold frames return [`TargetEstimate::NONE`] and leave the
    /// tie-break history untouched.
    pub fn extract(&mut self, frame: &ThermalFrame) -> TargetEstimate {
        let width = frame.width();
        let height = frame.height();

        let mut peak_temp = f32::NEG_INFINITY;
        for row in 0..height {
            for col in 0..width {
                let t = frame.at(col, row);
                if t > peak_temp {
                    peak_temp = t;
                }
            }
        }
        if peak_temp < self.threshold_c {
            return TargetEstimate::NONE;
        }

        let (peak_col, peak_row) = self.pick_peak(frame, peak_temp);
        let centroid_col = self.windowed_centroid(frame, peak_col, peak_row);
        self.prev_col = Some(centroid_col);

        let center = width as f32 / 2.0;
        let deg_per_col = self.fov_deg / width as f32;
        TargetEstimate {
            angle_offset_deg: (centroid_col - center) * deg_per_col,
            hotspot: true,
        }
    }

    /// Forget the previous estimate (between matches).
    pub fn clear_history(&mut self) {
        self.prev_col = None;
    }

    // Among cells equal to the maximum, prefer the column closest to the
    // previous estimate; with no history, the first in scan order wins,
    // which is the leftmost (and topmost) maximum.
    fn pick_peak(&self, frame: &ThermalFrame, peak_temp: f32) -> (usize, usize) {
        let mut best: Option<(usize, usize, f32)> = None;
        for row in 0..frame.height() {
            for col in 0..frame.width() {
                if frame.at(col, row) != peak_temp {
                    continue;
                }
                let distance = match self.prev_col {
                    Some(prev) => (col as f32 - prev).abs(),
                    None => col as f32,
                };
                match best {
                    Some((_, _, best_distance)) if distance >= best_distance => {}
                    _ => best = Some((col, row, distance)),
                }
            }
        }
        let (col, row, _) = best.unwrap_or((0, 0, 0.0));
        (col, row)
    }

    // Intensity-weighted column average over the window around the peak.
    // Weights are temperature above threshold, so cold neighbors contribute
    // nothing and a lone hot cell lands exactly on its own column.
    fn windowed_centroid(&self, frame: &ThermalFrame, peak_col: usize, peak_row: usize) -> f32 {
        let r = self.window_radius;
        let col_lo = peak_col.saturating_sub(r);
        let col_hi = (peak_col + r).min(frame.width() - 1);
        let row_lo = peak_row.saturating_sub(r);
        let row_hi = (peak_row + r).min(frame.height() - 1);

        let mut weight_sum = 0.0f32;
        let mut weighted_col = 0.0f32;
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let w = (frame.at(col, row) - self.threshold_c).max(0.0);
                weight_sum += w;
                weighted_col += w * col as f32;
            }
        }
        if weight_sum > 0.0 {
            weighted_col / weight_sum
        } else {
            // Peak sits exactly at threshold; fall back to its column.
            peak_col as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 32;
    const H: usize = 24;

    fn frame_from(cells: &[f32]) -> ThermalFrame {
        ThermalFrame::from_cells(W, H, 0, cells).unwrap()
    }

    fn ambient(temp: f32) -> Vec<f32> {
        vec![temp; W * H]
    }

    fn extractor() -> CentroidExtractor {
        CentroidExtractor::new(&ThermalConfig::default()).unwrap()
    }

    #[test]
    fn all_cold_frame_has_no_target() {
        let mut ex = extractor();
        let est = ex.extract(&frame_from(&ambient(20.0)));
        assert_eq!(est, TargetEstimate::NONE);
    }

    #[test]
    fn single_hot_cell_maps_proportionally() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[10 * W + 24] = 36.0; // row 10, column 24
        let est = ex.extract(&frame_from(&cells));

        assert!(est.hotspot);
        let expected = (24.0 - W as f32 / 2.0) * 55.0 / W as f32;
        assert!((est.angle_offset_deg - expected).abs() < 1e-4);
    }

    #[test]
    fn centered_hotspot_gives_near_zero_offset() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[12 * W + 16] = 36.0;
        let est = ex.extract(&frame_from(&cells));
        assert!(est.angle_offset_deg.abs() < 1.0);
    }

    #[test]
    fn tie_resolves_leftmost_without_history() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[5 * W + 6] = 36.0;
        cells[5 * W + 25] = 36.0;
        let est = ex.extract(&frame_from(&cells));

        let expected = (6.0 - W as f32 / 2.0) * 55.0 / W as f32;
        assert!((est.angle_offset_deg - expected).abs() < 1e-4);
    }

    #[test]
    fn tie_resolves_toward_previous_estimate() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[5 * W + 25] = 36.0;
        ex.extract(&frame_from(&cells));

        // Now two equal maxima; the one near column 25 should win.
        let mut cells = ambient(20.0);
        cells[5 * W + 6] = 36.0;
        cells[5 * W + 25] = 36.0;
        let est = ex.extract(&frame_from(&cells));

        let expected = (25.0 - W as f32 / 2.0) * 55.0 / W as f32;
        assert!((est.angle_offset_deg - expected).abs() < 1e-4);
    }

    #[test]
    fn warm_neighbors_pull_the_centroid() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[8 * W + 12] = 40.0;
        cells[8 * W + 13] = 35.0; // warm shoulder to the right
        let est = ex.extract(&frame_from(&cells));

        let lone_cell = (12.0 - W as f32 / 2.0) * 55.0 / W as f32;
        assert!(est.angle_offset_deg > lone_cell);
    }

    #[test]
    fn noise_outside_window_ignored() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[8 * W + 12] = 40.0;
        cells[20 * W + 30] = 31.0; // above threshold but far from the peak
        let est = ex.extract(&frame_from(&cells));

        let expected = (12.0 - W as f32 / 2.0) * 55.0 / W as f32;
        assert!((est.angle_offset_deg - expected).abs() < 1e-4);
    }

    #[test]
    fn no_target_preserves_tie_history() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[5 * W + 25] = 36.0;
        ex.extract(&frame_from(&cells));

        // A cold frame in between must not erase the history.
        ex.extract(&frame_from(&ambient(20.0)));

        let mut cells = ambient(20.0);
        cells[5 * W + 6] = 36.0;
        cells[5 * W + 25] = 36.0;
        let est = ex.extract(&frame_from(&cells));
        assert!(est.angle_offset_deg > 0.0);
    }

    #[test]
    fn clear_history_restores_leftmost_rule() {
        let mut ex = extractor();
        let mut cells = ambient(20.0);
        cells[5 * W + 25] = 36.0;
        ex.extract(&frame_from(&cells));
        ex.clear_history();

        let mut cells = ambient(20.0);
        cells[5 * W + 6] = 36.0;
        cells[5 * W + 25] = 36.0;
        let est = ex.extract(&frame_from(&cells));
        assert!(est.angle_offset_deg < 0.0);
    }
}
