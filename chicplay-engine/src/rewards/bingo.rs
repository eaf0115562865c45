//! Bingo card layout, trigger matching and pattern detection.
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::action::ActionType;

pub const GRID_SIZE: usize = 5;
pub const SQUARE_COUNT: usize = GRID_SIZE * GRID_SIZE;
/// Grid centre; always pre-marked.
pub const FREE_SQUARE_ID: usize = 12;

pub const FREE_TYPE: &str = "FREE";
pub const TARGET_TYPE: &str = "Target";
pub const BONUS_TYPE: &str = "Bonus";

pub type Keywords = SmallVec<[String; 4]>;

/// Record of the action that marked a square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareDetails {
    pub action: ActionType,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub keywords: Keywords,
    pub marked: bool,
    #[serde(default)]
    pub details: Option<SquareDetails>,
}

impl Square {
    fn from_template(id: usize, template: &SquareTemplate) -> Self {
        Self {
            id,
            kind: template.kind.to_string(),
            keywords: template.keywords.iter().map(|k| (*k).to_string()).collect(),
            marked: id == FREE_SQUARE_ID,
            details: None,
        }
    }

    /// Bidirectional, case-insensitive substring test against the square's
    /// type and keywords. `trigger` must already be lowercase.
    #[must_use]
    pub fn matches(&self, trigger: &str) -> bool {
        let kind = self.kind.to_lowercase();
        if trigger.contains(&kind) || kind.contains(trigger) {
            return true;
        }
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            !keyword.is_empty() && (trigger.contains(&keyword) || keyword.contains(trigger))
        })
    }

    #[must_use]
    pub fn is_target(&self) -> bool {
        self.kind == TARGET_TYPE
    }

    #[must_use]
    pub fn is_bonus(&self) -> bool {
        self.kind == BONUS_TYPE
    }
}

/// Lines and shapes that pay a completion bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Pattern {
    /// 1-based row index
    Row(u8),
    /// 1-based column index
    Column(u8),
    /// 1 = top-left to bottom-right, 2 = top-right to bottom-left
    Diagonal(u8),
    FourCorners,
    FullHouse,
}

static ALL_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    let lines = 1..=u8::try_from(GRID_SIZE).unwrap_or(5);
    let mut patterns: Vec<Pattern> = lines.clone().map(Pattern::Row).collect();
    patterns.extend(lines.map(Pattern::Column));
    patterns.extend([
        Pattern::Diagonal(1),
        Pattern::Diagonal(2),
        Pattern::FourCorners,
        Pattern::FullHouse,
    ]);
    patterns
});

impl Pattern {
    /// Every pattern in evaluation order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &ALL_PATTERNS
    }

    /// Square ids that must be marked for the pattern to hold.
    #[must_use]
    pub fn cells(self) -> SmallVec<[usize; SQUARE_COUNT]> {
        let last = GRID_SIZE - 1;
        match self {
            Self::Row(row) => {
                let start = usize::from(row.saturating_sub(1)) * GRID_SIZE;
                (start..start + GRID_SIZE).collect()
            }
            Self::Column(col) => {
                let col = usize::from(col.saturating_sub(1));
                (0..GRID_SIZE).map(|row| row * GRID_SIZE + col).collect()
            }
            Self::Diagonal(1) => (0..GRID_SIZE).map(|i| i * GRID_SIZE + i).collect(),
            Self::Diagonal(_) => (0..GRID_SIZE).map(|i| i * GRID_SIZE + (last - i)).collect(),
            Self::FourCorners => SmallVec::from_slice(&[
                0,
                last,
                last * GRID_SIZE,
                SQUARE_COUNT - 1,
            ]),
            Self::FullHouse => (0..SQUARE_COUNT).collect(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(n) => write!(f, "Row {n}"),
            Self::Column(n) => write!(f, "Column {n}"),
            Self::Diagonal(n) => write!(f, "Diagonal {n}"),
            Self::FourCorners => f.write_str("Four Corners"),
            Self::FullHouse => f.write_str("Full House"),
        }
    }
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Four Corners" => return Ok(Self::FourCorners),
            "Full House" => return Ok(Self::FullHouse),
            _ => {}
        }
        let (name, index) = s
            .rsplit_once(' ')
            .ok_or_else(|| format!("unknown pattern: {s}"))?;
        let index: u8 = index
            .parse()
            .map_err(|_| format!("bad pattern index: {s}"))?;
        let max = u8::try_from(GRID_SIZE).unwrap_or(5);
        match name {
            "Row" if (1..=max).contains(&index) => Ok(Self::Row(index)),
            "Column" if (1..=max).contains(&index) => Ok(Self::Column(index)),
            "Diagonal" if (1..=2).contains(&index) => Ok(Self::Diagonal(index)),
            _ => Err(format!("unknown pattern: {s}")),
        }
    }
}

impl From<Pattern> for String {
    fn from(value: Pattern) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Pattern {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

struct SquareTemplate {
    kind: &'static str,
    keywords: &'static [&'static str],
}

const fn tpl(kind: &'static str, keywords: &'static [&'static str]) -> SquareTemplate {
    SquareTemplate { kind, keywords }
}

// Row-major; index 12 is the FREE centre.
static DEFAULT_LAYOUT: [SquareTemplate; SQUARE_COUNT] = [
    tpl("Dress", &["dress", "maxi", "midi", "gown"]),
    tpl("Top", &["blouse", "shirt", "tee", "camisole"]),
    tpl("Shoes", &["shoe", "heel", "sneaker", "boot", "sandal"]),
    tpl("Bag", &["tote", "clutch", "purse", "handbag"]),
    tpl(TARGET_TYPE, &["featured", "editor pick"]),
    tpl("Jacket", &["jacket", "coat", "blazer"]),
    tpl("Skirt", &["skirt", "pleated"]),
    tpl("Jewelry", &["necklace", "earring", "bracelet", "pendant"]),
    tpl(BONUS_TYPE, &["new arrival"]),
    tpl("Denim", &["denim", "jeans"]),
    tpl("Swimwear", &["swim", "bikini"]),
    tpl("Knitwear", &["knit", "sweater", "cardigan"]),
    tpl(FREE_TYPE, &[]),
    tpl("Pants", &["trousers", "culottes", "slacks"]),
    tpl("Sunglasses", &["eyewear", "shades"]),
    tpl("Try-On", &["fitting", "virtual try"]),
    tpl("Activewear", &["legging", "yoga", "sports bra"]),
    tpl("Hat", &["beanie", "fedora", "beret"]),
    tpl("Wishlist", &["saved", "favorite"]),
    tpl("Scarf", &["shawl", "wrap"]),
    tpl(TARGET_TYPE, &["bestseller", "trending"]),
    tpl("Belt", &["buckle", "waist"]),
    tpl(BONUS_TYPE, &["limited", "exclusive"]),
    tpl("Jumpsuit", &["romper", "playsuit"]),
    tpl("Watch", &["timepiece", "wristwatch"]),
];

/// A 5x5 engagement card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingoCard {
    pub theme: String,
    pub squares: Vec<Square>,
    #[serde(default)]
    pub completed_patterns: BTreeSet<Pattern>,
    pub last_reset: NaiveDate,
}

impl BingoCard {
    /// Fresh card with the default layout and the centre pre-marked.
    #[must_use]
    pub fn new(theme: impl Into<String>, today: NaiveDate) -> Self {
        let squares = DEFAULT_LAYOUT
            .iter()
            .enumerate()
            .map(|(id, template)| Square::from_template(id, template))
            .collect();
        Self {
            theme: theme.into(),
            squares,
            completed_patterns: BTreeSet::new(),
            last_reset: today,
        }
    }

    /// First unmarked square matching `trigger`, scanning ids in ascending
    /// order. Scan order decides ties and must stay id-ascending.
    #[must_use]
    pub fn find_match(&self, trigger: &str) -> Option<usize> {
        let trigger = trigger.trim().to_lowercase();
        if trigger.is_empty() {
            return None;
        }
        self.squares
            .iter()
            .position(|square| !square.marked && square.matches(&trigger))
    }

    /// Full grid in id order with the centre marked.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.squares.len() == SQUARE_COUNT
            && self.squares.iter().enumerate().all(|(i, square)| square.id == i)
            && self.is_marked(FREE_SQUARE_ID)
    }

    #[must_use]
    pub fn is_marked(&self, id: usize) -> bool {
        self.squares.get(id).is_some_and(|square| square.marked)
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.squares.iter().filter(|square| square.marked).count()
    }

    #[must_use]
    pub fn pattern_satisfied(&self, pattern: Pattern) -> bool {
        pattern.cells().iter().all(|&id| self.is_marked(id))
    }

    /// Patterns satisfied by the current marks that have not been credited
    /// yet, recording them as completed. Each pattern is returned at most
    /// once over the card's lifetime.
    pub fn claim_new_patterns(&mut self) -> Vec<Pattern> {
        let fresh: Vec<Pattern> = Pattern::all()
            .iter()
            .copied()
            .filter(|pattern| !self.completed_patterns.contains(pattern))
            .filter(|pattern| self.pattern_satisfied(*pattern))
            .collect();
        self.completed_patterns.extend(fresh.iter().copied());
        fresh
    }
}
