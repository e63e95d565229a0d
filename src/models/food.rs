use strum::{Display, EnumIter, FromRepr};

/// Name used for class indices outside the trained model's classes.
pub const UNKNOWN_FOOD: &str = "Unknown";

pub const CALORIE_DISCLAIMER: &str =
    "*The calorie information is for reference only as ingredients and preparation methods may vary*";

/// Classes the detector weights were trained on, indexed by YOLO class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(u8)]
pub enum FoodClass {
    #[strum(to_string = "Soft-boiled egg")]
    SoftBoiledEgg = 0,
    #[strum(to_string = "Meatball")]
    Meatball = 1,
    #[strum(to_string = "Beef noodles")]
    BeefNoodles = 2,
    #[strum(to_string = "Braised cabbage")]
    BraisedCabbage = 3,
    #[strum(to_string = "Braised pork rice")]
    BraisedPorkRice = 4,
    #[strum(to_string = "Mushroom chicken soup")]
    MushroomChickenSoup = 5,
    #[strum(to_string = "Cucumber salad")]
    CucumberSalad = 6,
    #[strum(to_string = "Cold noodles")]
    ColdNoodles = 7,
    #[strum(to_string = "Fried chicken cutlet")]
    FriedChickenCutlet = 8,
    #[strum(to_string = "Egg pancake")]
    EggPancake = 9,
    #[strum(to_string = "Fish soup")]
    FishSoup = 10,
    #[strum(to_string = "Fried instant noodles")]
    FriedInstantNoodles = 11,
    #[strum(to_string = "Fried rice noodles")]
    FriedRiceNoodles = 12,
    #[strum(to_string = "Sponge gourd")]
    SpongeGourd = 13,
    #[strum(to_string = "Chicken rice")]
    ChickenRice = 14,
}

impl FoodClass {
    pub fn from_index(index: i64) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }
}

/// Display name for a detector class index.
pub fn food_name(index: i64) -> String {
    FoodClass::from_index(index)
        .map(|class| class.to_string())
        .unwrap_or_else(|| UNKNOWN_FOOD.to_string())
}

/// Row of the `foods` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CalorieRecord {
    pub calories: f64,
    pub unit: String,
}

/// A detected item after name and calorie resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabel {
    pub name: String,
    pub calories: Option<CalorieRecord>,
}

impl std::fmt::Display for ResolvedLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.calories {
            Some(record) => write!(f, "{} ({} {})", self.name, record.calories, record.unit),
            None => write!(f, "{} (Calorie info not available)", self.name),
        }
    }
}

/// Resolved labels of one detection run, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalorieSummary {
    pub items: Vec<ResolvedLabel>,
}

impl CalorieSummary {
    /// Sum of the known calorie values; items without a record count as zero.
    pub fn total_calories(&self) -> f64 {
        self.items
            .iter()
            .filter_map(|item| item.calories.as_ref())
            .map(|record| record.calories)
            .sum()
    }

    pub fn label_list(&self) -> String {
        if self.items.is_empty() {
            return "No food items recognized".to_string();
        }
        self.items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_message_text(&self) -> String {
        format!(
            "Recognition result: {}\nTotal calories: {} kcal\n{}",
            self.label_list(),
            self.total_calories(),
            CALORIE_DISCLAIMER
        )
    }
}
