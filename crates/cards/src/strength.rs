use super::rank::Rank;

/// Hand category, weakest to strongest. The numeric value is 1..=10.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard = 1,
    OnePair = 2,
    TwoPair = 3,
    ThreeOfAKind = 4,
    Straight = 5,
    Flush = 6,
    FullHouse = 7,
    FourOfAKind = 8,
    StraightFlush = 9,
    RoyalFlush = 10,
}

impl Ranking {
    pub const fn value(&self) -> u8 {
        *self as u8
    }
}

impl serde::Serialize for Ranking {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.value())
    }
}

/// A fully evaluated hand.
///
/// Totally ordered: `value` packs the category and up to five kicker ranks
/// so that comparing values compares hands. Ties split pots.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Strength {
    value: u32,
    rank: Ranking,
    kickers: Vec<Rank>,
    description: String,
}

impl Strength {
    /// Builds a strength from a category and its ordered tiebreakers.
    /// Kickers are most-significant first and at most five deep.
    pub fn new(rank: Ranking, kickers: Vec<Rank>) -> Self {
        debug_assert!(kickers.len() <= 5);
        // pack: category in bits 20.., five 4-bit kicker nibbles below
        let nibbles = kickers
            .iter()
            .map(|k| k.value() as u32 - 2)
            .chain(std::iter::repeat(0))
            .take(5)
            .fold(0u32, |v, k| (v << 4) | k);
        let value = ((rank.value() as u32) << 20) | nibbles;
        let description = Self::describe(rank, &kickers);
        Self {
            value,
            rank,
            kickers,
            description,
        }
    }
    /// Packed comparison key.
    pub fn value(&self) -> u32 {
        self.value
    }
    /// Hand category.
    pub fn rank(&self) -> Ranking {
        self.rank
    }
    /// Ordered tiebreakers, most significant first.
    pub fn kickers(&self) -> &[Rank] {
        &self.kickers
    }
    /// Human-readable hand name ("Two Pair, Aces and Kings").
    pub fn description(&self) -> &str {
        &self.description
    }
    fn describe(rank: Ranking, kickers: &[Rank]) -> String {
        let top = kickers.first().copied().unwrap_or(Rank::Two);
        match rank {
            Ranking::HighCard => format!("{} High", top.label()),
            Ranking::OnePair => format!("Pair of {}", top.plural()),
            Ranking::TwoPair => match kickers {
                [hi, lo, ..] => format!("Two Pair, {} and {}", hi.plural(), lo.plural()),
                _ => "Two Pair".to_string(),
            },
            Ranking::ThreeOfAKind => format!("Three of a Kind, {}", top.plural()),
            Ranking::Straight => format!("Straight to the {}", top.label()),
            Ranking::Flush => format!("Flush, {} High", top.label()),
            Ranking::FullHouse => match kickers {
                [trips, pair, ..] => {
                    format!("Full House, {} full of {}", trips.plural(), pair.plural())
                }
                _ => "Full House".to_string(),
            },
            Ranking::FourOfAKind => format!("Four of a Kind, {}", top.plural()),
            Ranking::StraightFlush => format!("Straight Flush to the {}", top.label()),
            Ranking::RoyalFlush => "Royal Flush".to_string(),
        }
    }
}

impl PartialEq for Strength {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl Eq for Strength {}
impl PartialOrd for Strength {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Strength {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}
