use super::card::Card;
use super::hole::Hole;
use super::rank::Rank;
use super::suit::Suit;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Failure modes for deal operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    /// No cards remain to deal.
    Empty,
    /// Fewer cards remain than the operation requires.
    Insufficient { need: usize, have: usize },
    /// The deck failed its uniqueness or count audit.
    Invalid(String),
}

impl std::fmt::Display for DeckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "deck is empty"),
            Self::Insufficient { need, have } => {
                write!(f, "need {} cards but only {} remain", need, have)
            }
            Self::Invalid(s) => write!(f, "deck invalid: {}", s),
        }
    }
}

impl std::error::Error for DeckError {}

/// A 52-card deck split into a remaining pile and a dealt-or-burned tail.
///
/// Every card appears exactly once across the two piles. A deck is
/// constructed per hand, shuffled with Fisher–Yates, and consumed from the
/// top by the deal operations. Burned cards land in the dealt tail so the
/// audit in [`validate`](Self::validate) accounts for them.
///
/// The generator seeds from OS entropy by default; [`Deck::seeded`] pins it
/// for reproducible runs.
#[derive(Debug, Clone)]
pub struct Deck {
    remaining: Vec<Card>,
    dealt: Vec<Card>,
    rng: SmallRng,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// A fresh ordered deck with an OS-entropy generator.
    pub fn new() -> Self {
        Self {
            remaining: Self::fresh(),
            dealt: Vec::new(),
            rng: SmallRng::from_os_rng(),
        }
    }
    /// A fresh ordered deck with a pinned generator for deterministic runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            remaining: Self::fresh(),
            dealt: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }
    fn fresh() -> Vec<Card> {
        Suit::all()
            .into_iter()
            .flat_map(|s| Rank::all().into_iter().map(move |r| Card::from((r, s))))
            .collect()
    }
}

impl Deck {
    /// Cards not yet dealt or burned.
    pub fn remaining(&self) -> &[Card] {
        &self.remaining
    }
    /// Cards dealt or burned so far, oldest first.
    pub fn dealt(&self) -> &[Card] {
        &self.dealt
    }
    /// Restores all 52 cards in canonical order and empties the dealt tail.
    pub fn reset(&mut self) {
        self.remaining = Self::fresh();
        self.dealt.clear();
    }
    /// Fisher–Yates permutation of the remaining cards.
    pub fn shuffle(&mut self) {
        self.remaining.shuffle(&mut self.rng);
    }
}

impl Deck {
    /// Deals one card from the top.
    pub fn deal_card(&mut self) -> Result<Card, DeckError> {
        let card = self.remaining.pop().ok_or(DeckError::Empty)?;
        self.dealt.push(card);
        Ok(card)
    }
    /// Deals n cards from the top.
    pub fn deal_cards(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if self.remaining.len() < n {
            return Err(DeckError::Insufficient {
                need: n,
                have: self.remaining.len(),
            });
        }
        (0..n).map(|_| self.deal_card()).collect()
    }
    /// Removes one card face-down before dealing community cards.
    pub fn burn_card(&mut self) -> Result<Card, DeckError> {
        self.deal_card()
    }
    /// Deals two cards to each of k seats, one card around the table at a
    /// time, returning the holes in seat order.
    pub fn deal_hole_cards(&mut self, k: usize) -> Result<Vec<Hole>, DeckError> {
        if self.remaining.len() < 2 * k {
            return Err(DeckError::Insufficient {
                need: 2 * k,
                have: self.remaining.len(),
            });
        }
        let firsts = self.deal_cards(k)?;
        let seconds = self.deal_cards(k)?;
        Ok(firsts
            .into_iter()
            .zip(seconds)
            .map(Hole::from)
            .collect())
    }
    /// Burns one card, then deals the three flop cards.
    pub fn deal_flop(&mut self) -> Result<Vec<Card>, DeckError> {
        self.burn_then(3)
    }
    /// Burns one card, then deals the turn card.
    pub fn deal_turn(&mut self) -> Result<Card, DeckError> {
        self.burn_then(1).map(|cards| cards[0])
    }
    /// Burns one card, then deals the river card.
    pub fn deal_river(&mut self) -> Result<Card, DeckError> {
        self.burn_then(1).map(|cards| cards[0])
    }
    fn burn_then(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if self.remaining.len() < n + 1 {
            return Err(DeckError::Insufficient {
                need: n + 1,
                have: self.remaining.len(),
            });
        }
        self.burn_card()?;
        self.deal_cards(n)
    }
}

impl Deck {
    /// Confirms uniqueness and that dealt + remaining cover all 52 cards.
    pub fn validate(&self) -> Result<(), DeckError> {
        let mut seen = std::collections::HashSet::new();
        for card in self.remaining.iter().chain(self.dealt.iter()) {
            if !seen.insert(*card) {
                return Err(DeckError::Invalid(format!("duplicate card {}", card)));
            }
        }
        if seen.len() != 52 {
            return Err(DeckError::Invalid(format!(
                "{} + {} cards, expected 52",
                self.remaining.len(),
                self.dealt.len()
            )));
        }
        Ok(())
    }
}
