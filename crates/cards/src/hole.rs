use super::card::Card;

/// A player's two private cards, in the order they were dealt.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Hole([Card; 2]);

impl Hole {
    pub const fn cards(&self) -> [Card; 2] {
        self.0
    }
}

impl From<(Card, Card)> for Hole {
    fn from((a, b): (Card, Card)) -> Self {
        Self([a, b])
    }
}

impl IntoIterator for Hole {
    type Item = Card;
    type IntoIter = std::array::IntoIter<Card, 2>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0[0], self.0[1])
    }
}
