use crate::seat::PlayerId;
use crate::seat::Seat;
use felt_cards::Strength;
use felt_core::Chips;

/// Raised when a pot has no seat left to receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PotError {
    Undistributable,
}

impl std::fmt::Display for PotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undistributable => write!(f, "pot has no eligible recipient"),
        }
    }
}

impl std::error::Error for PotError {}

/// A single pot layer: its amount and the seats that can win it.
///
/// Pots are not accumulated imperatively; they are derived from the
/// per-seat contribution ledger (each seat's `spent`) at round close, so
/// side-pot formation is a pure function of the ledger. Money from folded
/// seats stays in the layers but folded seats are never eligible.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Pot {
    amount: Chips,
    eligible: Vec<PlayerId>,
    #[serde(rename = "isMainPot")]
    main: bool,
}

impl Pot {
    pub fn amount(&self) -> Chips {
        self.amount
    }
    pub fn eligible(&self) -> &[PlayerId] {
        &self.eligible
    }
    pub fn is_main(&self) -> bool {
        self.main
    }

    /// Canonical side-pot layering from the seats' contribution ledger.
    ///
    /// Distinct contribution levels ascending L1 < L2 < … < Lk; the pot at
    /// level Li holds `(Li − Li−1) × |{seats: spent ≥ Li}|` chips and is
    /// winnable by the not-folded seats with `spent ≥ Li`. The first layer
    /// is the main pot.
    pub fn form(seats: &[Seat]) -> Vec<Self> {
        let mut levels: Vec<Chips> = seats
            .iter()
            .map(Seat::spent)
            .filter(|&spent| spent > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();
        let mut pots = Vec::with_capacity(levels.len());
        let mut prev = 0;
        for level in levels {
            let covering = seats.iter().filter(|s| s.spent() >= level).count() as Chips;
            let eligible = seats
                .iter()
                .filter(|s| !s.is_folded() && s.spent() >= level)
                .map(Seat::id)
                .collect();
            pots.push(Self {
                amount: (level - prev) * covering,
                eligible,
                main: pots.is_empty(),
            });
            prev = level;
        }
        pots
    }

    /// Distributes every pot layer to its winners.
    ///
    /// `strengths` holds the showdown hands of the seats still in the hand;
    /// `order` is the post-button rotation of those seats, which settles
    /// both odd chips (one each to the earliest winners) and the fallback
    /// when a layer's eligible seats have all folded.
    pub fn distribute(
        pots: &[Self],
        strengths: &[(PlayerId, Strength)],
        order: &[PlayerId],
    ) -> Result<Vec<(PlayerId, Chips)>, PotError> {
        let mut rewards: Vec<(PlayerId, Chips)> = order.iter().map(|&id| (id, 0)).collect();
        for pot in pots {
            let best = pot
                .eligible
                .iter()
                .filter_map(|id| strengths.iter().find(|(s, _)| s == id))
                .max_by(|(_, a), (_, b)| a.cmp(b))
                .map(|(_, strength)| strength.clone());
            let mut winners: Vec<PlayerId> = match best {
                Some(best) => strengths
                    .iter()
                    .filter(|(id, s)| pot.eligible.contains(id) && *s == best)
                    .map(|(id, _)| *id)
                    .collect(),
                // every eligible seat folded out from under this layer
                None => order.to_vec(),
            };
            if winners.is_empty() {
                return Err(PotError::Undistributable);
            }
            winners.sort_by_key(|id| order.iter().position(|o| o == id).unwrap_or(usize::MAX));
            let share = pot.amount / winners.len() as Chips;
            let odd = pot.amount % winners.len() as Chips;
            for (i, winner) in winners.iter().enumerate() {
                let bonus = if (i as Chips) < odd { 1 } else { 0 };
                if let Some(entry) = rewards.iter_mut().find(|(id, _)| id == winner) {
                    entry.1 += share + bonus;
                }
            }
        }
        rewards.retain(|(_, amount)| *amount > 0);
        Ok(rewards)
    }
}
