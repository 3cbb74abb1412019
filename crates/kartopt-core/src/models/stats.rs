//! Additive stat blocks and the 13 stat axes.

use crate::KartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// A stat that varies by terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainStat {
    pub land: f32,
    pub air: f32,
    pub water: f32,
    pub antigrav: f32,
}

impl TerrainStat {
    pub const ZERO: Self = Self {
        land: 0.0,
        air: 0.0,
        water: 0.0,
        antigrav: 0.0,
    };

    /// The same value on every terrain.
    pub const fn uniform(value: f32) -> Self {
        Self {
            land: value,
            air: value,
            water: value,
            antigrav: value,
        }
    }
}

impl Add for TerrainStat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            land: self.land + rhs.land,
            air: self.air + rhs.air,
            water: self.water + rhs.water,
            antigrav: self.antigrav + rhs.antigrav,
        }
    }
}

/// Numeric attributes of one build component, or of a whole build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBlock {
    pub speed: TerrainStat,
    pub accel: f32,
    pub weight: f32,
    pub handling: TerrainStat,
    pub traction: f32,
    pub mini_turbo: f32,
    pub invuln: f32,
}

impl StatBlock {
    pub const ZERO: Self = Self::uniform(0.0);

    /// The same value on every axis.
    pub const fn uniform(value: f32) -> Self {
        Self {
            speed: TerrainStat::uniform(value),
            accel: value,
            weight: value,
            handling: TerrainStat::uniform(value),
            traction: value,
            mini_turbo: value,
            invuln: value,
        }
    }

    /// Value on a single axis.
    pub fn get(&self, axis: StatAxis) -> f32 {
        match axis {
            StatAxis::LandSpeed => self.speed.land,
            StatAxis::WaterSpeed => self.speed.water,
            StatAxis::AirSpeed => self.speed.air,
            StatAxis::AntigravSpeed => self.speed.antigrav,
            StatAxis::Accel => self.accel,
            StatAxis::Weight => self.weight,
            StatAxis::LandHandling => self.handling.land,
            StatAxis::WaterHandling => self.handling.water,
            StatAxis::AirHandling => self.handling.air,
            StatAxis::AntigravHandling => self.handling.antigrav,
            StatAxis::Traction => self.traction,
            StatAxis::MiniTurbo => self.mini_turbo,
            StatAxis::Invuln => self.invuln,
        }
    }

    /// Mutable access to a single axis.
    pub fn get_mut(&mut self, axis: StatAxis) -> &mut f32 {
        match axis {
            StatAxis::LandSpeed => &mut self.speed.land,
            StatAxis::WaterSpeed => &mut self.speed.water,
            StatAxis::AirSpeed => &mut self.speed.air,
            StatAxis::AntigravSpeed => &mut self.speed.antigrav,
            StatAxis::Accel => &mut self.accel,
            StatAxis::Weight => &mut self.weight,
            StatAxis::LandHandling => &mut self.handling.land,
            StatAxis::WaterHandling => &mut self.handling.water,
            StatAxis::AirHandling => &mut self.handling.air,
            StatAxis::AntigravHandling => &mut self.handling.antigrav,
            StatAxis::Traction => &mut self.traction,
            StatAxis::MiniTurbo => &mut self.mini_turbo,
            StatAxis::Invuln => &mut self.invuln,
        }
    }

    /// All 13 axes paired with their display labels, in display order.
    pub fn labelled_stats(&self) -> Vec<(&'static str, f32)> {
        StatAxis::ALL
            .iter()
            .map(|&axis| (axis.label(), self.get(axis)))
            .collect()
    }
}

impl Add for StatBlock {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            speed: self.speed + rhs.speed,
            accel: self.accel + rhs.accel,
            weight: self.weight + rhs.weight,
            handling: self.handling + rhs.handling,
            traction: self.traction + rhs.traction,
            mini_turbo: self.mini_turbo + rhs.mini_turbo,
            invuln: self.invuln + rhs.invuln,
        }
    }
}

impl Sum for StatBlock {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a StatBlock> for StatBlock {
    fn sum<I: Iterator<Item = &'a StatBlock>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Which group an axis belongs to for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisGroup {
    Speed,
    Handling,
    Scalar,
}

/// One of the 13 stat axes, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatAxis {
    LandSpeed,
    WaterSpeed,
    AirSpeed,
    AntigravSpeed,
    Accel,
    Weight,
    LandHandling,
    WaterHandling,
    AirHandling,
    AntigravHandling,
    Traction,
    MiniTurbo,
    Invuln,
}

impl StatAxis {
    pub const COUNT: usize = 13;

    pub const ALL: [StatAxis; Self::COUNT] = [
        StatAxis::LandSpeed,
        StatAxis::WaterSpeed,
        StatAxis::AirSpeed,
        StatAxis::AntigravSpeed,
        StatAxis::Accel,
        StatAxis::Weight,
        StatAxis::LandHandling,
        StatAxis::WaterHandling,
        StatAxis::AirHandling,
        StatAxis::AntigravHandling,
        StatAxis::Traction,
        StatAxis::MiniTurbo,
        StatAxis::Invuln,
    ];

    /// Position in [`StatAxis::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn group(self) -> AxisGroup {
        match self {
            StatAxis::LandSpeed | StatAxis::WaterSpeed | StatAxis::AirSpeed | StatAxis::AntigravSpeed => {
                AxisGroup::Speed
            }
            StatAxis::LandHandling
            | StatAxis::WaterHandling
            | StatAxis::AirHandling
            | StatAxis::AntigravHandling => AxisGroup::Handling,
            _ => AxisGroup::Scalar,
        }
    }

    /// English display label.
    pub fn label(self) -> &'static str {
        match self {
            StatAxis::LandSpeed => "Speed (ground)",
            StatAxis::WaterSpeed => "Speed (water)",
            StatAxis::AirSpeed => "Speed (air)",
            StatAxis::AntigravSpeed => "Speed (anti-gravity)",
            StatAxis::Accel => "Acceleration",
            StatAxis::Weight => "Weight",
            StatAxis::LandHandling => "Handling (ground)",
            StatAxis::WaterHandling => "Handling (water)",
            StatAxis::AirHandling => "Handling (air)",
            StatAxis::AntigravHandling => "Handling (anti-gravity)",
            StatAxis::Traction => "Traction",
            StatAxis::MiniTurbo => "Mini-turbo",
            StatAxis::Invuln => "Invincibility",
        }
    }

    /// Wire name, as used in JSON and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            StatAxis::LandSpeed => "landSpeed",
            StatAxis::WaterSpeed => "waterSpeed",
            StatAxis::AirSpeed => "airSpeed",
            StatAxis::AntigravSpeed => "antigravSpeed",
            StatAxis::Accel => "accel",
            StatAxis::Weight => "weight",
            StatAxis::LandHandling => "landHandling",
            StatAxis::WaterHandling => "waterHandling",
            StatAxis::AirHandling => "airHandling",
            StatAxis::AntigravHandling => "antigravHandling",
            StatAxis::Traction => "traction",
            StatAxis::MiniTurbo => "miniTurbo",
            StatAxis::Invuln => "invuln",
        }
    }
}

impl FromStr for StatAxis {
    type Err = KartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatAxis::ALL
            .iter()
            .copied()
            .find(|axis| axis.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| KartError::Validation {
                field: "axis".to_string(),
                message: format!("unknown stat axis: {}", s),
            })
    }
}

impl fmt::Display for StatAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(speed: f32, accel: f32) -> StatBlock {
        StatBlock {
            speed: TerrainStat::uniform(speed),
            accel,
            ..StatBlock::ZERO
        }
    }

    #[test]
    fn test_addition_is_pointwise() {
        let total = block(1.0, 2.0) + block(0.5, 0.25);
        assert_eq!(total.speed, TerrainStat::uniform(1.5));
        assert_eq!(total.accel, 2.25);
        assert_eq!(total.weight, 0.0);
    }

    #[test]
    fn test_sum_of_parts() {
        let parts = [block(1.0, 0.0), block(2.0, 1.0), block(0.0, 1.0), block(0.25, 0.5)];
        let total: StatBlock = parts.iter().sum();
        assert_eq!(total.speed.land, 3.25);
        assert_eq!(total.accel, 2.5);
    }

    #[test]
    fn test_axis_accessors_cover_every_field() {
        let mut stats = StatBlock::ZERO;
        for (i, axis) in StatAxis::ALL.iter().enumerate() {
            *stats.get_mut(*axis) = i as f32;
        }
        for (i, axis) in StatAxis::ALL.iter().enumerate() {
            assert_eq!(stats.get(*axis), i as f32);
            assert_eq!(axis.index(), i);
        }
    }

    #[test]
    fn test_labelled_stats_order() {
        let labels: Vec<_> = StatBlock::ZERO.labelled_stats().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels.len(), 13);
        assert_eq!(labels[0], "Speed (ground)");
        assert_eq!(labels[4], "Acceleration");
        assert_eq!(labels[12], "Invincibility");
    }

    #[test]
    fn test_axis_keys_match_serde_names() {
        for axis in StatAxis::ALL {
            let json = serde_json::to_string(&axis).unwrap();
            assert_eq!(json, format!("\"{}\"", axis.key()));
            assert_eq!(axis.key().parse::<StatAxis>().unwrap(), axis);
        }
        assert_eq!("MINITURBO".parse::<StatAxis>().unwrap(), StatAxis::MiniTurbo);
        assert!("boost".parse::<StatAxis>().is_err());
    }

    #[test]
    fn test_axis_groups() {
        let speed = StatAxis::ALL.iter().filter(|a| a.group() == AxisGroup::Speed).count();
        let handling = StatAxis::ALL.iter().filter(|a| a.group() == AxisGroup::Handling).count();
        assert_eq!((speed, handling), (4, 4));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "speed": {"land": 1, "air": 2, "water": 3, "antigrav": 4},
            "accel": 1.5, "weight": 2, "traction": 3, "miniTurbo": 4, "invuln": 5,
            "handling": {"land": 0.5, "air": 0.5, "water": 0.5, "antigrav": 0.5}
        }"#;
        let stats: StatBlock = serde_json::from_str(json).unwrap();
        assert_eq!(stats.speed.water, 3.0);
        assert_eq!(stats.mini_turbo, 4.0);
        assert_eq!(stats.handling, TerrainStat::uniform(0.5));
    }
}
