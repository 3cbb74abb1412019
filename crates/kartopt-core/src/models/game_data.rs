//! The remote dataset: component catalogs and rivals.

use crate::models::stats::StatBlock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Characters sharing one stat block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub characters: Vec<String>,
    #[serde(flatten)]
    pub stats: StatBlock,
}

/// Karts sharing one stat block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KartStats {
    pub karts: Vec<String>,
    pub inward_drift: bool,
    #[serde(flatten)]
    pub stats: StatBlock,
}

/// Wheels sharing one stat block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelStats {
    pub wheels: Vec<String>,
    #[serde(flatten)]
    pub stats: StatBlock,
}

/// Gliders sharing one stat block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GliderStats {
    pub gliders: Vec<String>,
    #[serde(flatten)]
    pub stats: StatBlock,
}

/// A catalog entry: a group of component names sharing one stat block.
pub trait ComponentGroup {
    fn names(&self) -> &[String];
    fn stats(&self) -> &StatBlock;

    fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }
}

macro_rules! component_group {
    ($ty:ty, $field:ident) => {
        impl ComponentGroup for $ty {
            fn names(&self) -> &[String] {
                &self.$field
            }

            fn stats(&self) -> &StatBlock {
                &self.stats
            }
        }
    };
}

component_group!(CharacterStats, characters);
component_group!(KartStats, karts);
component_group!(WheelStats, wheels);
component_group!(GliderStats, gliders);

/// The four component categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Character,
    Kart,
    Wheel,
    Glider,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Character, Category::Kart, Category::Wheel, Category::Glider];
}

/// The full game dataset served at `data/<platform>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub characters: Vec<CharacterStats>,
    pub karts: Vec<KartStats>,
    pub wheels: Vec<WheelStats>,
    pub gliders: Vec<GliderStats>,
    #[serde(default)]
    pub rivals: HashMap<String, Vec<String>>,
}

/// Indices of one group per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub character: usize,
    pub kart: usize,
    pub wheel: usize,
    pub glider: usize,
}

fn find<G: ComponentGroup>(groups: &[G], name: &str) -> Option<usize> {
    groups.iter().position(|g| g.contains(name))
}

impl GameData {
    /// Index of the group containing `name` in `category`.
    pub fn find(&self, category: Category, name: &str) -> Option<usize> {
        match category {
            Category::Character => find(&self.characters, name),
            Category::Kart => find(&self.karts, name),
            Category::Wheel => find(&self.wheels, name),
            Category::Glider => find(&self.gliders, name),
        }
    }

    /// Names of every group in `category`, in catalog order.
    pub fn group_names(&self, category: Category) -> Vec<&[String]> {
        match category {
            Category::Character => self.characters.iter().map(|g| g.names()).collect(),
            Category::Kart => self.karts.iter().map(|g| g.names()).collect(),
            Category::Wheel => self.wheels.iter().map(|g| g.names()).collect(),
            Category::Glider => self.gliders.iter().map(|g| g.names()).collect(),
        }
    }

    /// Summed stats of a build. `None` if any index is out of range.
    pub fn total(&self, selection: Selection) -> Option<StatBlock> {
        Some(
            self.characters.get(selection.character)?.stats
                + self.karts.get(selection.kart)?.stats
                + self.wheels.get(selection.wheel)?.stats
                + self.gliders.get(selection.glider)?.stats,
        )
    }

    /// Rivals of a character. Unknown characters have none.
    pub fn rivals_of(&self, character: &str) -> &[String] {
        self.rivals.get(character).map(Vec::as_slice).unwrap_or(&[])
    }
}
