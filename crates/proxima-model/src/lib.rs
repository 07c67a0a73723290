//! PROXIMA Volume Model - distance to simulated audio volume
//!
//! Pure and deterministic: the same (distance, quality) always yields the
//! same volume for a given configuration. The model is the only place that
//! knows how proximity sounds.
//!
//! Policy ladder, in order:
//! 1. Quality below threshold -> silence
//! 2. Distance at or beyond cutoff -> silence
//! 3. Within near distance -> max volume plateau
//! 4. Beyond far distance -> min volume plateau
//! 5. Otherwise interpolate (linear / inverse square / logarithmic)
//! 6. Optional quality weighting, then clamp to [min, max]

use proxima_core::{Curve, VolumeConfig};

/// Distance-to-volume evaluator over one resolved configuration
#[derive(Clone, Debug)]
pub struct VolumeModel {
    config: VolumeConfig,
}

impl VolumeModel {
    pub fn new(config: VolumeConfig) -> Self {
        VolumeModel { config }
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    /// Compute the simulated volume for one reading
    pub fn volume(&self, distance: f64, quality: f64) -> f64 {
        let c = &self.config;

        if quality < c.quality_threshold {
            return 0.0;
        }
        if distance >= c.cutoff_distance_m {
            return 0.0;
        }

        let near = c.near_distance_m;
        let far = c.far_distance_m;
        let min = c.min_volume;
        let max = c.max_volume;

        let mut volume = if distance <= near {
            max
        } else if distance >= far {
            min
        } else {
            let t = (distance - near) / (far - near);
            match c.curve_type {
                Curve::InverseSquare => {
                    // V = V_max / (1 + k*d^2), k = 1, mimics sound propagation
                    let v = max / (1.0 + (distance - near).powi(2));
                    v.max(min)
                }
                Curve::Logarithmic => max - (max - min) * (t * 10.0).ln_1p() / 10f64.ln_1p(),
                // Linear, and the documented fallback for unknown curve names
                Curve::Linear | Curve::Unknown => max - t * (max - min),
            }
        };

        if c.apply_quality_weighting {
            volume *= quality;
        }

        // max(min, min(max, v)) rather than clamp: total even when the
        // bounds are inverted, so an unvalidated config cannot panic here
        volume.min(max).max(min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn linear_model() -> VolumeModel {
        VolumeModel::new(VolumeConfig {
            near_distance_m: 1.5,
            far_distance_m: 4.0,
            cutoff_distance_m: 5.0,
            min_volume: 0.0,
            max_volume: 1.0,
            curve_type: Curve::Linear,
            apply_quality_weighting: false,
            quality_threshold: 0.5,
        })
    }

    #[test]
    fn test_linear_scenario() {
        let model = linear_model();
        assert_eq!(model.volume(1.0, 0.9), 1.0); // within near
        assert_eq!(model.volume(4.0, 0.9), 0.0); // at far
        assert_eq!(model.volume(2.75, 0.9), 0.5); // midpoint
        assert_eq!(model.volume(6.0, 0.9), 0.0); // beyond cutoff
    }

    #[test]
    fn test_quality_threshold_silences() {
        let model = linear_model();
        assert_eq!(model.volume(0.5, 0.49), 0.0);
        assert_eq!(model.volume(2.0, 0.0), 0.0);
        // at the threshold the reading counts
        assert_eq!(model.volume(1.0, 0.5), 1.0);
    }

    #[test]
    fn test_cutoff_silences_regardless_of_quality() {
        let model = linear_model();
        assert_eq!(model.volume(5.0, 1.0), 0.0);
        assert_eq!(model.volume(100.0, 1.0), 0.0);
    }

    #[test]
    fn test_near_plateau_with_weighting() {
        let mut config = linear_model().config().clone();
        config.apply_quality_weighting = true;
        let model = VolumeModel::new(config);
        assert_eq!(model.volume(1.0, 0.8), 0.8);
    }

    #[test]
    fn test_inverse_square_monotonic_and_floored() {
        let mut config = linear_model().config().clone();
        config.curve_type = Curve::InverseSquare;
        config.min_volume = 0.1;
        let model = VolumeModel::new(config);

        let near = model.volume(1.6, 0.9);
        let far = model.volume(3.9, 0.9);
        assert!(near > far);
        assert!(far >= 0.1);
    }

    #[test]
    fn test_logarithmic_between_plateaus() {
        let mut config = linear_model().config().clone();
        config.curve_type = Curve::Logarithmic;
        let model = VolumeModel::new(config);

        let v = model.volume(2.75, 0.9);
        assert!(v > 0.0 && v < 1.0);
        // log falloff drops faster than linear early in the band
        assert!(v < linear_model().volume(2.75, 0.9));
        // the start of the band is still near the max plateau
        assert!(model.volume(1.51, 0.9) > 0.9);
    }

    #[test]
    fn test_inverted_bounds_never_panic() {
        let mut config = linear_model().config().clone();
        config.min_volume = 0.8;
        config.max_volume = 0.2;
        let model = VolumeModel::new(config);

        // the floor wins when the bounds are inverted
        assert_eq!(model.volume(2.0, 0.9), 0.8);
        // silence short-circuits still apply
        assert_eq!(model.volume(6.0, 0.9), 0.0);
        assert_eq!(model.volume(2.0, 0.1), 0.0);
    }

    #[test]
    fn test_unknown_curve_evaluates_linear() {
        let mut config = linear_model().config().clone();
        config.curve_type = Curve::Unknown;
        let model = VolumeModel::new(config);
        assert_eq!(model.volume(2.75, 0.9), 0.5);
    }

    proptest! {
        #[test]
        fn prop_volume_always_in_bounds(
            distance in 0.0f64..100.0,
            quality in 0.0f64..=1.0,
        ) {
            let model = linear_model();
            let v = model.volume(distance, quality);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_volume_in_bounds_all_curves(
            distance in 0.0f64..100.0,
            quality in 0.0f64..=1.0,
            curve_idx in 0usize..4,
            weighted in any::<bool>(),
        ) {
            let mut config = linear_model().config().clone();
            config.curve_type = [
                Curve::Linear,
                Curve::InverseSquare,
                Curve::Logarithmic,
                Curve::Unknown,
            ][curve_idx];
            config.apply_quality_weighting = weighted;
            config.min_volume = 0.1;
            let model = VolumeModel::new(config);

            let v = model.volume(distance, quality);
            // silence short-circuits bypass the min floor by design of the
            // threshold and cutoff rules
            prop_assert!(v == 0.0 || (0.1..=1.0).contains(&v));
        }

        #[test]
        fn prop_deterministic(distance in 0.0f64..10.0, quality in 0.5f64..=1.0) {
            let model = linear_model();
            prop_assert_eq!(model.volume(distance, quality), model.volume(distance, quality));
        }
    }
}
