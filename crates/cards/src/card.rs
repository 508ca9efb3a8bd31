use super::rank::Rank;
use super::suit::Suit;

/// A playing card. Equality is by value; the wire form is
/// `{"suit": "H" | "D" | "C" | "S", "rank": 2..=14}`.
///
/// # Parsing
///
/// Cards can be parsed from two-character strings like `"As"` (ace of
/// spades) or `"Tc"` (ten of clubs). Use [`Card::parse`] for multiple cards.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Card {
    suit: Suit,
    rank: Rank,
}

impl Card {
    pub const fn rank(&self) -> Rank {
        self.rank
    }
    pub const fn suit(&self) -> Suit {
        self.suit
    }
}

impl From<(Rank, Suit)> for Card {
    fn from((rank, suit): (Rank, Suit)) -> Self {
        Self { suit, rank }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit())
    }
}

impl TryFrom<&str> for Card {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(u), None) => {
                let rank = Rank::try_from(r)?;
                let suit = Suit::try_from(u)?;
                Ok(Card::from((rank, suit)))
            }
            _ => Err(anyhow::anyhow!("expected 2 characters: {}", s)),
        }
    }
}

impl Card {
    /// Parses a string of card notations into a vector of cards.
    ///
    /// Whitespace is ignored. Each card is two characters: rank then suit.
    /// Returns an error if any card fails to parse.
    pub fn parse(s: &str) -> anyhow::Result<Vec<Self>> {
        s.replace(char::is_whitespace, "")
            .chars()
            .collect::<Vec<_>>()
            .chunks(2)
            .map(|pair| pair.iter().collect::<String>())
            .map(|pair| Self::try_from(pair.as_str()))
            .collect()
    }
}
