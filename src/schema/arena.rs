//! Arena geometry: bounds, rectangular obstacles and the target point.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Axis-aligned rectangular obstacle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    /// Build an obstacle from two opposite corners in any order.
    ///
    /// A drag gesture can start at any corner, so the top-left is the
    /// componentwise minimum of the two points.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (b.0 - a.0).abs(),
            height: (b.1 - a.1).abs(),
        }
    }

    /// Half-open containment test: left/top edges inclusive, right/bottom exclusive.
    #[inline]
    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.width
            && point.1 >= self.y
            && point.1 < self.y + self.height
    }
}

/// The environment a population trains in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Arena width; probes with x outside `[0, width]` crash.
    pub width: f32,
    /// Arena height; probes with y outside `[0, height]` crash.
    pub height: f32,
    /// Obstacles, fixed for the run.
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Point the rockets are trying to reach.
    pub target: (f32, f32),
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            obstacles: Vec::new(),
            target: (700.0, 300.0),
        }
    }
}

impl Arena {
    /// Create an empty arena with the given bounds and target.
    pub fn new(width: f32, height: f32, target: (f32, f32)) -> Self {
        Self {
            width,
            height,
            obstacles: Vec::new(),
            target,
        }
    }

    /// Add an obstacle (builder style).
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// True if the point lies outside the closed arena rectangle.
    #[inline]
    pub fn out_of_bounds(&self, point: (f32, f32)) -> bool {
        point.0 < 0.0 || point.0 > self.width || point.1 < 0.0 || point.1 > self.height
    }

    /// True if the point is out of bounds or inside any obstacle.
    pub fn is_blocked(&self, point: (f32, f32)) -> bool {
        self.out_of_bounds(point) || self.obstacles.iter().any(|o| o.contains(point))
    }

    /// Validate arena geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(ConfigError::InvalidArena);
        }
        for (i, o) in self.obstacles.iter().enumerate() {
            let finite = [o.x, o.y, o.width, o.height].iter().all(|v| v.is_finite());
            if !finite || o.width < 0.0 || o.height < 0.0 {
                return Err(ConfigError::InvalidObstacle(i));
            }
        }
        if !(self.target.0.is_finite() && self.target.1.is_finite()) {
            return Err(ConfigError::InvalidTarget);
        }
        Ok(())
    }
}
