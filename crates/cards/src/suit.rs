/// One of the four card suits.
///
/// The wire form is a single uppercase letter (`"H"`, `"D"`, `"C"`, `"S"`);
/// the display form is the lowercase letter used in standard hand notation
/// (`As`, `Td`).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    /// All four suits in canonical order.
    pub const fn all() -> [Self; 4] {
        [Self::Hearts, Self::Diamonds, Self::Clubs, Self::Spades]
    }
    /// Uppercase wire letter.
    pub const fn symbol(&self) -> char {
        match self {
            Self::Hearts => 'H',
            Self::Diamonds => 'D',
            Self::Clubs => 'C',
            Self::Spades => 'S',
        }
    }
}

impl TryFrom<char> for Suit {
    type Error = anyhow::Error;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'H' => Ok(Self::Hearts),
            'D' => Ok(Self::Diamonds),
            'C' => Ok(Self::Clubs),
            'S' => Ok(Self::Spades),
            _ => Err(anyhow::anyhow!("invalid suit: {}", c)),
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.symbol().to_ascii_lowercase())
    }
}

impl serde::Serialize for Suit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_char(self.symbol())
    }
}
impl<'de> serde::Deserialize<'de> for Suit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.chars()
            .next()
            .filter(|_| s.chars().count() == 1)
            .ok_or_else(|| serde::de::Error::custom("expected single-letter suit"))
            .and_then(|c| Self::try_from(c).map_err(serde::de::Error::custom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijective_symbol() {
        for suit in Suit::all() {
            assert_eq!(suit, Suit::try_from(suit.symbol()).unwrap());
        }
    }

    #[test]
    fn wire_form_is_uppercase_letter() {
        let json = serde_json::to_string(&Suit::Hearts).unwrap();
        assert_eq!(json, "\"H\"");
        let back: Suit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Suit::Hearts);
    }
}
