use super::card::Card;
use super::rank::Rank;
use super::strength::Ranking;
use super::strength::Strength;
use super::suit::Suit;

/// Pure best-five-of-seven hand ranking.
///
/// Given 5 to 7 cards (hole + board), finds the strongest 5-card hand and
/// returns its [`Strength`]. Category detection runs strongest-first so the
/// first match wins.
pub struct Evaluator;

impl Evaluator {
    /// Ranks the best 5-card hand among the given cards.
    pub fn strength(cards: &[Card]) -> Strength {
        debug_assert!((5..=7).contains(&cards.len()));
        let counts = Self::rank_counts(cards);
        let flush = Self::flush_suit(cards);

        if let Some(suit) = flush {
            let suited: Vec<Rank> = cards
                .iter()
                .filter(|c| c.suit() == suit)
                .map(|c| c.rank())
                .collect();
            if let Some(high) = Self::straight_high(&suited) {
                return match high {
                    Rank::Ace => Strength::new(Ranking::RoyalFlush, vec![]),
                    _ => Strength::new(Ranking::StraightFlush, vec![high]),
                };
            }
        }
        if let Some(quad) = Self::of_a_kind(&counts, 4).first().copied() {
            let kickers = Self::kickers(cards, &[quad], 1);
            return Strength::new(Ranking::FourOfAKind, [vec![quad], kickers].concat());
        }
        let trips = Self::of_a_kind(&counts, 3);
        let pairs = Self::of_a_kind(&counts, 2);
        if let Some(&top) = trips.first() {
            // the pair half may be a second set of trips
            let pair = trips
                .get(1)
                .copied()
                .into_iter()
                .chain(pairs.iter().copied())
                .max();
            if let Some(pair) = pair {
                return Strength::new(Ranking::FullHouse, vec![top, pair]);
            }
        }
        if let Some(suit) = flush {
            let mut suited: Vec<Rank> = cards
                .iter()
                .filter(|c| c.suit() == suit)
                .map(|c| c.rank())
                .collect();
            suited.sort_unstable_by(|a, b| b.cmp(a));
            suited.truncate(5);
            return Strength::new(Ranking::Flush, suited);
        }
        let ranks: Vec<Rank> = cards.iter().map(|c| c.rank()).collect();
        if let Some(high) = Self::straight_high(&ranks) {
            return Strength::new(Ranking::Straight, vec![high]);
        }
        if let Some(&top) = trips.first() {
            let kickers = Self::kickers(cards, &[top], 2);
            return Strength::new(Ranking::ThreeOfAKind, [vec![top], kickers].concat());
        }
        if pairs.len() >= 2 {
            let (hi, lo) = (pairs[0], pairs[1]);
            let kickers = Self::kickers(cards, &[hi, lo], 1);
            return Strength::new(Ranking::TwoPair, [vec![hi, lo], kickers].concat());
        }
        if let Some(&pair) = pairs.first() {
            let kickers = Self::kickers(cards, &[pair], 3);
            return Strength::new(Ranking::OnePair, [vec![pair], kickers].concat());
        }
        Strength::new(Ranking::HighCard, Self::kickers(cards, &[], 5))
    }

    /// Count of each rank among the cards, keyed by rank.
    fn rank_counts(cards: &[Card]) -> Vec<(Rank, usize)> {
        Rank::all()
            .into_iter()
            .map(|r| (r, cards.iter().filter(|c| c.rank() == r).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
    /// Ranks appearing exactly n times, strongest first.
    fn of_a_kind(counts: &[(Rank, usize)], n: usize) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = counts
            .iter()
            .filter(|(_, c)| *c == n)
            .map(|(r, _)| *r)
            .collect();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        ranks
    }
    /// The suit holding five or more cards, if any.
    fn flush_suit(cards: &[Card]) -> Option<Suit> {
        Suit::all()
            .into_iter()
            .find(|s| cards.iter().filter(|c| c.suit() == *s).count() >= 5)
    }
    /// Highest straight top card among the given ranks, wheel included.
    fn straight_high(ranks: &[Rank]) -> Option<Rank> {
        let mut present = [false; 15];
        for r in ranks {
            present[r.value() as usize] = true;
        }
        // ace plays low in the wheel
        present[1] = present[14];
        (5..=14usize)
            .rev()
            .find(|&high| (high - 4..=high).all(|v| present[v]))
            .and_then(|high| Rank::try_from(high as u8).ok())
    }
    /// The n highest ranks not already used by the made hand.
    fn kickers(cards: &[Card], used: &[Rank], n: usize) -> Vec<Rank> {
        let mut rest: Vec<Rank> = cards
            .iter()
            .map(|c| c.rank())
            .filter(|r| !used.contains(r))
            .collect();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        rest.dedup();
        rest.truncate(n);
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(s: &str) -> Vec<Card> {
        Card::parse(s).unwrap()
    }

    #[test]
    fn royal_flush() {
        let s = Evaluator::strength(&cards("As Ks Qs Js Ts 2c 3d"));
        assert_eq!(s.rank(), Ranking::RoyalFlush);
    }

    #[test]
    fn straight_flush_beats_quads() {
        let sf = Evaluator::strength(&cards("9s 8s 7s 6s 5s Ad Ac"));
        let quads = Evaluator::strength(&cards("Ad Ac Ah As Kd 2c 3c"));
        assert_eq!(sf.rank(), Ranking::StraightFlush);
        assert_eq!(quads.rank(), Ranking::FourOfAKind);
        assert!(sf > quads);
    }

    #[test]
    fn wheel_is_lowest_straight() {
        let wheel = Evaluator::strength(&cards("Ah 2d 3c 4s 5h Kd Qc"));
        assert_eq!(wheel.rank(), Ranking::Straight);
        assert_eq!(wheel.kickers(), &[Rank::Five]);
        let six = Evaluator::strength(&cards("2h 3d 4c 5s 6h Kd Qc"));
        assert!(six > wheel);
    }

    #[test]
    fn full_house_from_two_sets_of_trips() {
        let s = Evaluator::strength(&cards("Kd Kc Kh 9d 9c 9h 2s"));
        assert_eq!(s.rank(), Ranking::FullHouse);
        assert_eq!(s.kickers(), &[Rank::King, Rank::Nine]);
    }

    #[test]
    fn flush_takes_top_five() {
        let s = Evaluator::strength(&cards("Ah Th 8h 6h 3h 2h Kd"));
        assert_eq!(s.rank(), Ranking::Flush);
        assert_eq!(s.kickers().first(), Some(&Rank::Ace));
        assert_eq!(s.kickers().len(), 5);
    }

    #[test]
    fn two_pair_with_kicker() {
        let s = Evaluator::strength(&cards("Ad Ac Kd Kc 7h 4s 2d"));
        assert_eq!(s.rank(), Ranking::TwoPair);
        assert_eq!(s.kickers(), &[Rank::Ace, Rank::King, Rank::Seven]);
    }

    #[test]
    fn three_pairs_use_best_two_and_kicker() {
        let s = Evaluator::strength(&cards("Ad Ac Kd Kc 7h 7s Qd"));
        assert_eq!(s.rank(), Ranking::TwoPair);
        assert_eq!(s.kickers(), &[Rank::Ace, Rank::King, Rank::Queen]);
    }

    #[test]
    fn pair_kickers_resolve_ties() {
        let a = Evaluator::strength(&cards("Ad Ac Kd 9c 7h 4s 2d"));
        let b = Evaluator::strength(&cards("Ah As Qd 9d 7c 4c 2h"));
        assert_eq!(a.rank(), Ranking::OnePair);
        assert!(a > b);
    }

    #[test]
    fn high_card_description() {
        let s = Evaluator::strength(&cards("Ad Jc 9d 7c 5h 4s 2d"));
        assert_eq!(s.rank(), Ranking::HighCard);
        assert_eq!(s.description(), "Ace High");
    }

    #[test]
    fn board_plays_for_everyone() {
        let board = "As Ks Qs Js Ts";
        let a = Evaluator::strength(&cards(&format!("{} 2c 3d", board)));
        let b = Evaluator::strength(&cards(&format!("{} 9h 9d", board)));
        assert_eq!(a, b);
    }
}
