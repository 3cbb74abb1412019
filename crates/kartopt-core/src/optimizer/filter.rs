//! Per-axis range filters and optimization directions.

use crate::config::SearchConfig;
use crate::models::{AxisGroup, StatAxis, StatBlock};
use crate::KartError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user wants from one axis. Only affects ranking, never filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Minimize,
    #[default]
    Ignore,
    Maximize,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Ignore, Direction::Minimize, Direction::Maximize];

    pub fn multiplier(self) -> f32 {
        match self {
            Direction::Minimize => -1.0,
            Direction::Ignore => 0.0,
            Direction::Maximize => 1.0,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> i8 {
        match direction {
            Direction::Minimize => -1,
            Direction::Ignore => 0,
            Direction::Maximize => 1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = KartError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Minimize),
            0 => Ok(Direction::Ignore),
            1 => Ok(Direction::Maximize),
            other => Err(KartError::Validation {
                field: "direction".to_string(),
                message: format!("expected -1, 0 or 1, got {}", other),
            }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Minimize => "Minimize",
            Direction::Ignore => "Don't optimize",
            Direction::Maximize => "Maximize",
        })
    }
}

/// Inclusive bounds and direction for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFilter {
    pub min: f32,
    pub max: f32,
    pub direction: Direction,
}

impl AxisFilter {
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for AxisFilter {
    fn default() -> Self {
        Self {
            min: SearchConfig::DEFAULT_MIN,
            max: SearchConfig::DEFAULT_MAX,
            direction: Direction::Ignore,
        }
    }
}

/// A complete filter: bounds and direction on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OptimizerFilter {
    axes: [AxisFilter; StatAxis::COUNT],
}

impl OptimizerFilter {
    pub fn new(axes: [AxisFilter; StatAxis::COUNT]) -> Self {
        Self { axes }
    }

    /// Every axis accepts any finite value; every direction is ignore.
    pub fn unbounded() -> Self {
        Self {
            axes: [AxisFilter {
                min: f32::NEG_INFINITY,
                max: f32::INFINITY,
                direction: Direction::Ignore,
            }; StatAxis::COUNT],
        }
    }

    pub fn axis(&self, axis: StatAxis) -> &AxisFilter {
        &self.axes[axis.index()]
    }

    pub fn set_range(&mut self, axis: StatAxis, min: f32, max: f32) -> &mut Self {
        let filter = &mut self.axes[axis.index()];
        filter.min = min;
        filter.max = max;
        self
    }

    pub fn set_direction(&mut self, axis: StatAxis, direction: Direction) -> &mut Self {
        self.axes[axis.index()].direction = direction;
        self
    }

    /// Whether every axis of `stats` lies inside its bounds.
    pub fn accepts(&self, stats: &StatBlock) -> bool {
        StatAxis::ALL
            .iter()
            .all(|&axis| self.axis(axis).contains(stats.get(axis)))
    }

    /// Weighted score of a stat total.
    ///
    /// Speed and handling contributions are each averaged over the number of
    /// axes in the group that are not ignored (at least 1). The five scalar
    /// axes add in directly.
    pub fn score(&self, stats: &StatBlock) -> f32 {
        let mut speed = (0.0f32, 0.0f32);
        let mut handling = (0.0f32, 0.0f32);
        let mut scalar = 0.0f32;

        for &axis in &StatAxis::ALL {
            let multiplier = self.axis(axis).direction.multiplier();
            let contribution = multiplier * stats.get(axis);
            match axis.group() {
                AxisGroup::Speed => {
                    speed.0 += contribution;
                    speed.1 += multiplier.abs();
                }
                AxisGroup::Handling => {
                    handling.0 += contribution;
                    handling.1 += multiplier.abs();
                }
                AxisGroup::Scalar => scalar += contribution,
            }
        }

        speed.0 / speed.1.max(1.0) + handling.0 / handling.1.max(1.0) + scalar
    }
}

/// Filter fields as a user edits them; any of them may be blank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterInputs {
    pub min: [Option<f32>; StatAxis::COUNT],
    pub max: [Option<f32>; StatAxis::COUNT],
    pub directions: [Option<Direction>; StatAxis::COUNT],
}

impl FilterInputs {
    /// All fields blank.
    pub fn empty() -> Self {
        Self {
            min: [None; StatAxis::COUNT],
            max: [None; StatAxis::COUNT],
            directions: [None; StatAxis::COUNT],
        }
    }

    /// The filter, if every field is filled in.
    pub fn complete(&self) -> Option<OptimizerFilter> {
        let mut axes = [AxisFilter::default(); StatAxis::COUNT];
        for (i, axis) in axes.iter_mut().enumerate() {
            *axis = AxisFilter {
                min: self.min[i]?,
                max: self.max[i]?,
                direction: self.directions[i]?,
            };
        }
        Some(OptimizerFilter::new(axes))
    }

    /// Axes with at least one blank field.
    pub fn missing(&self) -> Vec<StatAxis> {
        StatAxis::ALL
            .iter()
            .copied()
            .filter(|axis| {
                let i = axis.index();
                self.min[i].is_none() || self.max[i].is_none() || self.directions[i].is_none()
            })
            .collect()
    }
}

/// Default inputs: every axis `[0.75, 5.75]`, ignored.
impl Default for FilterInputs {
    fn default() -> Self {
        Self::from(OptimizerFilter::default())
    }
}

impl From<OptimizerFilter> for FilterInputs {
    fn from(filter: OptimizerFilter) -> Self {
        let mut inputs = Self::empty();
        for (i, axis) in filter.axes.iter().enumerate() {
            inputs.min[i] = Some(axis.min);
            inputs.max[i] = Some(axis.max);
            inputs.directions[i] = Some(axis.direction);
        }
        inputs
    }
}
