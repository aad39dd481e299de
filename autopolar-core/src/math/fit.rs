//! Total-least-squares line fit through a 2D point cloud

use super::vec2::Vec2;

/// Below this length the unnormalized fit direction is considered degenerate
pub const MIN_DIRECTION_LENGTH: f64 = 1e-6;

/// Result of a line fit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineFit {
    /// Unit direction of the line (sign is arbitrary)
    pub direction: Vec2,
    /// Centroid of the fitted points
    pub center: Vec2,
}

impl LineFit {
    /// Orthogonal projection of a point onto the fitted line
    pub fn project(&self, point: Vec2) -> Vec2 {
        self.center + self.direction * self.direction.dot(point - self.center)
    }
}

/// Fit a line through `points` minimizing perpendicular distances
///
/// Returns `None` for fewer than two points or when the points have no
/// usable spread (e.g. all identical).
pub fn linear_fit(points: &[Vec2]) -> Option<LineFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let mut mean = Vec2::ZERO;
    let mut x2 = 0.0;
    let mut y2 = 0.0;
    let mut xy = 0.0;

    for p in points {
        mean += *p;
        x2 += p.x * p.x;
        y2 += p.y * p.y;
        xy += p.x * p.y;
    }

    let n = n as f64;
    mean /= n;
    x2 /= n;
    y2 /= n;
    xy /= n;

    let cov = xy - mean.x * mean.y;
    let var_x = x2 - mean.x * mean.x;
    let var_y = y2 - mean.y * mean.y;

    // Near-vertical lines are better conditioned from the Y variance
    let direction = if var_x.abs() < var_y.abs() {
        Vec2::new(-cov, -var_y)
    } else {
        Vec2::new(var_x, cov)
    };

    let length = direction.length();
    if !(length > MIN_DIRECTION_LENGTH) {
        return None;
    }

    Some(LineFit {
        direction: direction / length,
        center: mean,
    })
}
