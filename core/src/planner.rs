//! Weekly meal plan: seven days, lunch and dinner, one recipe snapshot per slot.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealTime {
    Lunch,
    Dinner,
}

impl MealTime {
    pub const ALL: [MealTime; 2] = [MealTime::Lunch, MealTime::Dinner];

    fn index(self) -> usize {
        match self {
            Self::Lunch => 0,
            Self::Dinner => 1,
        }
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lunch => write!(f, "lunch"),
            Self::Dinner => write!(f, "dinner"),
        }
    }
}

impl FromStr for MealTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => bail!("Invalid meal '{other}'. Must be one of: lunch, dinner"),
        }
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// A (day, meal) address in the plan, written `monday-lunch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub day: Weekday,
    pub meal: MealTime,
}

impl SlotKey {
    pub const COUNT: usize = 14;

    #[must_use]
    pub fn new(day: Weekday, meal: MealTime) -> Self {
        Self { day, meal }
    }

    /// Every slot in calendar order, lunch before dinner.
    pub fn all() -> impl Iterator<Item = SlotKey> {
        WEEK.into_iter()
            .flat_map(|day| MealTime::ALL.into_iter().map(move |meal| SlotKey { day, meal }))
    }

    fn index(self) -> usize {
        self.day.num_days_from_monday() as usize * MealTime::ALL.len() + self.meal.index()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", day_name(self.day), self.meal)
    }
}

impl FromStr for SlotKey {
    type Err = anyhow::Error;

    /// Accepts `monday-lunch`, `mon:dinner`, `Tue-Lunch` and similar.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (day, meal) = s
            .split_once(':')
            .or_else(|| s.split_once('-'))
            .with_context(|| {
                format!("Invalid slot '{s}'. Use 'day-meal' (e.g. 'monday-lunch' or 'mon:dinner')")
            })?;
        let day = Weekday::from_str(day.trim())
            .map_err(|_| anyhow!("Invalid day '{day}'. Use monday-sunday or mon-sun"))?;
        let meal = meal.parse()?;
        Ok(Self { day, meal })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where a dragged recipe comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragSource {
    SavedList { recipe_id: String },
    Slot(SlotKey),
}

/// Where it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTarget {
    SavedList,
    Slot(SlotKey),
    Trash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    Assigned { slot: SlotKey },
    Moved { from: SlotKey, to: SlotKey },
    Removed { slot: SlotKey },
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedSlot<'a> {
    pub slot: SlotKey,
    pub recipe: Option<&'a Recipe>,
}

#[derive(Debug, Clone, Default)]
pub struct MealPlan {
    slots: [Option<Recipe>; SlotKey::COUNT],
}

impl MealPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, slot: SlotKey) -> Option<&Recipe> {
        self.slots[slot.index()].as_ref()
    }

    /// Put a copy of `recipe` in the slot, replacing whatever was there.
    pub fn assign(&mut self, slot: SlotKey, recipe: &Recipe) -> Option<Recipe> {
        self.slots[slot.index()].replace(recipe.clone())
    }

    /// Move the snapshot in `from` to `to`, overwriting `to`.
    /// Returns false when `from` is empty.
    pub fn move_slot(&mut self, from: SlotKey, to: SlotKey) -> bool {
        if from == to {
            return self.get(from).is_some();
        }
        let Some(recipe) = self.slots[from.index()].take() else {
            return false;
        };
        self.slots[to.index()] = Some(recipe);
        true
    }

    pub fn clear_slot(&mut self, slot: SlotKey) -> Option<Recipe> {
        self.slots[slot.index()].take()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = PlannedSlot<'_>> {
        SlotKey::all().map(move |slot| PlannedSlot {
            slot,
            recipe: self.get(slot),
        })
    }

    /// Planned recipes in calendar order; a recipe planned twice appears twice.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        SlotKey::all().filter_map(move |slot| self.get(slot))
    }

    /// Apply a drag-and-drop gesture. `saved` is the saved-recipe list the
    /// sidebar shows; drops onto the sidebar are disabled.
    pub fn handle_drop(
        &mut self,
        source: &DragSource,
        destination: Option<&DropTarget>,
        saved: &[Recipe],
    ) -> Result<DropOutcome> {
        let Some(destination) = destination else {
            return Ok(DropOutcome::Ignored);
        };

        match (source, destination) {
            (DragSource::SavedList { recipe_id }, DropTarget::Slot(slot)) => {
                let recipe = saved
                    .iter()
                    .find(|r| &r.id == recipe_id)
                    .with_context(|| format!("Recipe '{recipe_id}' is not in your cookbook"))?;
                self.assign(*slot, recipe);
                Ok(DropOutcome::Assigned { slot: *slot })
            }
            (DragSource::Slot(from), DropTarget::Slot(to)) => {
                if from != to && self.move_slot(*from, *to) {
                    Ok(DropOutcome::Moved {
                        from: *from,
                        to: *to,
                    })
                } else {
                    Ok(DropOutcome::Ignored)
                }
            }
            (DragSource::Slot(slot), DropTarget::Trash) => match self.clear_slot(*slot) {
                Some(_) => Ok(DropOutcome::Removed { slot: *slot }),
                None => Ok(DropOutcome::Ignored),
            },
            (_, DropTarget::SavedList) | (DragSource::SavedList { .. }, DropTarget::Trash) => {
                Ok(DropOutcome::Ignored)
            }
        }
    }
}

impl Serialize for MealPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
