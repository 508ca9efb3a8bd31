/// Card rank from deuce through ace.
///
/// The wire form is the numeric value `2..=14` with aces high. Display uses
/// the standard single-character notation (`2`–`9`, `T`, `J`, `Q`, `K`, `A`).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// All thirteen ranks in ascending order.
    pub const fn all() -> [Self; 13] {
        [
            Self::Two,
            Self::Three,
            Self::Four,
            Self::Five,
            Self::Six,
            Self::Seven,
            Self::Eight,
            Self::Nine,
            Self::Ten,
            Self::Jack,
            Self::Queen,
            Self::King,
            Self::Ace,
        ]
    }
    /// Numeric wire value, `2..=14`.
    pub const fn value(&self) -> u8 {
        *self as u8 + 2
    }
    /// Full word for hand descriptions ("Ace", "Ten").
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Two => "Two",
            Self::Three => "Three",
            Self::Four => "Four",
            Self::Five => "Five",
            Self::Six => "Six",
            Self::Seven => "Seven",
            Self::Eight => "Eight",
            Self::Nine => "Nine",
            Self::Ten => "Ten",
            Self::Jack => "Jack",
            Self::Queen => "Queen",
            Self::King => "King",
            Self::Ace => "Ace",
        }
    }
    /// Pluralized word for hand descriptions ("Aces", "Sixes").
    pub fn plural(&self) -> String {
        match self {
            Self::Six => "Sixes".to_string(),
            _ => format!("{}s", self.label()),
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = anyhow::Error;
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::all()
            .into_iter()
            .find(|r| r.value() == n)
            .ok_or_else(|| anyhow::anyhow!("invalid rank: {}", n))
    }
}
impl From<Rank> for u8 {
    fn from(r: Rank) -> u8 {
        r.value()
    }
}

impl TryFrom<char> for Rank {
    type Error = anyhow::Error;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            '2' => Ok(Self::Two),
            '3' => Ok(Self::Three),
            '4' => Ok(Self::Four),
            '5' => Ok(Self::Five),
            '6' => Ok(Self::Six),
            '7' => Ok(Self::Seven),
            '8' => Ok(Self::Eight),
            '9' => Ok(Self::Nine),
            'T' => Ok(Self::Ten),
            'J' => Ok(Self::Jack),
            'Q' => Ok(Self::Queen),
            'K' => Ok(Self::King),
            'A' => Ok(Self::Ace),
            _ => Err(anyhow::anyhow!("invalid rank: {}", c)),
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let c = match self {
            Self::Ten => 'T',
            Self::Jack => 'J',
            Self::Queen => 'Q',
            Self::King => 'K',
            Self::Ace => 'A',
            other => (b'0' + other.value()) as char,
        };
        write!(f, "{}", c)
    }
}

impl serde::Serialize for Rank {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.value())
    }
}
impl<'de> serde::Deserialize<'de> for Rank {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let n = u8::deserialize(deserializer)?;
        Self::try_from(n).map_err(serde::de::Error::custom)
    }
}
