//! Crown shape envelope

use serde::{Deserialize, Serialize};

const MIN_RATIO: f32 = 0.2;
const RATIO_RANGE: f32 = 0.8;
const TAPER_BASE: f32 = 0.5;
const TAPER_RANGE: f32 = 0.5;
const FLAME_PEAK: f32 = 0.7;
const FLAME_FALLOFF: f32 = 1.0 - FLAME_PEAK;

/// Silhouette of a tree crown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrownShape {
    Conical,
    Spherical,
    Hemispherical,
    #[default]
    Cylindrical,
    TaperedCylindrical,
    Flame,
    InverseConical,
    TendFlame,
}

impl CrownShape {
    pub const ALL: [CrownShape; 8] = [
        CrownShape::Conical,
        CrownShape::Spherical,
        CrownShape::Hemispherical,
        CrownShape::Cylindrical,
        CrownShape::TaperedCylindrical,
        CrownShape::Flame,
        CrownShape::InverseConical,
        CrownShape::TendFlame,
    ];
}

/// Branch length multiplier for a height ratio in the crown.
///
/// `ratio` is 1 at the crown base and 0 at its top; it is clamped to [0, 1].
pub fn get_shape_ratio(shape: CrownShape, ratio: f32) -> f32 {
    let r = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    match shape {
        CrownShape::Conical => MIN_RATIO + RATIO_RANGE * r,
        CrownShape::Spherical => MIN_RATIO + RATIO_RANGE * (std::f32::consts::PI * r).sin(),
        CrownShape::Hemispherical => MIN_RATIO + RATIO_RANGE * (std::f32::consts::FRAC_PI_2 * r).sin(),
        CrownShape::Cylindrical => 1.0,
        CrownShape::TaperedCylindrical => TAPER_BASE + TAPER_RANGE * r,
        CrownShape::Flame => {
            if r <= FLAME_PEAK {
                r / FLAME_PEAK
            } else {
                (1.0 - r) / FLAME_FALLOFF
            }
        }
        CrownShape::InverseConical => 1.0 - RATIO_RANGE * r,
        CrownShape::TendFlame => {
            if r <= FLAME_PEAK {
                TAPER_BASE + TAPER_RANGE * r / FLAME_PEAK
            } else {
                TAPER_BASE + TAPER_RANGE * (1.0 - r) / FLAME_FALLOFF
            }
        }
    }
}
