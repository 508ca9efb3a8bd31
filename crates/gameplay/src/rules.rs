use crate::action::Action;
use crate::seat::PlayerId;
use crate::seat::Status;
use crate::table::TableState;
use felt_core::Chips;

/// Why an intended action is not legal right now.
///
/// Validation errors are recoverable and cause no state change; the
/// rejection is surfaced to the submitting session with a stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotToAct,
    CannotCheck,
    NothingToCall,
    BetAlreadyOpen,
    BetBelowMinimum,
    RaiseUnopened,
    RaiseBelowMinimum,
    CannotReraise,
    InsufficientChips,
}

impl RejectReason {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotToAct => "NOT_TO_ACT",
            Self::CannotCheck => "CANNOT_CHECK",
            Self::NothingToCall => "NOTHING_TO_CALL",
            Self::BetAlreadyOpen => "BET_ALREADY_OPEN",
            Self::BetBelowMinimum => "BET_BELOW_MINIMUM",
            Self::RaiseUnopened => "RAISE_UNOPENED",
            Self::RaiseBelowMinimum => "RAISE_BELOW_MINIMUM",
            Self::CannotReraise => "CANNOT_RERAISE",
            Self::InsufficientChips => "INSUFFICIENT_CHIPS",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotToAct => write!(f, "it is not this seat's turn"),
            Self::CannotCheck => write!(f, "cannot check facing a bet"),
            Self::NothingToCall => write!(f, "there is no bet to call"),
            Self::BetAlreadyOpen => write!(f, "the betting is already open; raise instead"),
            Self::BetBelowMinimum => write!(f, "bet is below the big blind"),
            Self::RaiseUnopened => write!(f, "nothing to raise; bet instead"),
            Self::RaiseBelowMinimum => write!(f, "raise is below the minimum"),
            Self::CannotReraise => {
                write!(f, "the action has not been reopened since this seat last acted")
            }
            Self::InsufficientChips => write!(f, "not enough chips"),
        }
    }
}

impl std::error::Error for RejectReason {}

/// Kind of action, without amounts, for advertising legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// A legal move and its amount bounds.
///
/// `bet` bounds are opening amounts; `raise` bounds are raise-to totals
/// for the round; `call` and `all-in` bounds are the exact resulting
/// commitment, already clamped to the seat's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ActionOption {
    pub action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Chips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Chips>,
}

impl ActionOption {
    fn unbounded(action: ActionKind) -> Self {
        Self {
            action,
            min: None,
            max: None,
        }
    }
    fn bounded(action: ActionKind, min: Chips, max: Chips) -> Self {
        Self {
            action,
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Decides legality of a seat's intended action against the table state.
pub struct Rules;

impl Rules {
    /// Returns `Ok` if the action may be applied, otherwise the reason it
    /// was rejected. Never mutates state.
    pub fn validate(
        state: &TableState,
        player: PlayerId,
        action: Action,
    ) -> Result<(), RejectReason> {
        let pos = state.position_of(player).ok_or(RejectReason::NotToAct)?;
        if state.to_act() != Some(pos) {
            return Err(RejectReason::NotToAct);
        }
        let seat = &state.seats()[pos];
        let high = state.high_bet();
        match action {
            Action::Fold => Ok(()),
            Action::AllIn => Ok(()),
            Action::Check => match seat.stake() == high {
                true => Ok(()),
                false => Err(RejectReason::CannotCheck),
            },
            Action::Call => match high > seat.stake() {
                true => Ok(()),
                false => Err(RejectReason::NothingToCall),
            },
            Action::Bet { amount } => {
                if high > 0 {
                    return Err(RejectReason::BetAlreadyOpen);
                }
                if amount > seat.stack() {
                    return Err(RejectReason::InsufficientChips);
                }
                if amount < state.big_blind().min(seat.stack()) {
                    return Err(RejectReason::BetBelowMinimum);
                }
                Ok(())
            }
            Action::Raise { amount } => {
                if high == 0 {
                    return Err(RejectReason::RaiseUnopened);
                }
                // a short all-in that failed the minimum does not reopen
                // the action; seats it left behind may only call or fold
                if seat.acted() {
                    return Err(RejectReason::CannotReraise);
                }
                let ceiling = seat.stake() + seat.stack();
                if amount > ceiling {
                    return Err(RejectReason::InsufficientChips);
                }
                if amount >= high + state.min_raise() {
                    return Ok(());
                }
                // a short all-in over the high bet stands, but does not
                // reopen the action (applied by the engine)
                match amount == ceiling && amount > high {
                    true => Ok(()),
                    false => Err(RejectReason::RaiseBelowMinimum),
                }
            }
        }
    }

    /// The closed set of legal moves for a seat, with per-action bounds.
    /// Empty when the seat is not to act.
    pub fn options(state: &TableState, player: PlayerId) -> Vec<ActionOption> {
        let pos = match state.position_of(player) {
            Some(pos) if state.to_act() == Some(pos) => pos,
            _ => return Vec::new(),
        };
        let seat = &state.seats()[pos];
        if seat.status() != Status::Betting {
            return Vec::new();
        }
        let high = state.high_bet();
        let ceiling = seat.stake() + seat.stack();
        let mut options = vec![ActionOption::unbounded(ActionKind::Fold)];
        if seat.stake() == high {
            options.push(ActionOption::unbounded(ActionKind::Check));
        }
        if high > seat.stake() {
            let owed = (high - seat.stake()).min(seat.stack());
            options.push(ActionOption::bounded(ActionKind::Call, owed, owed));
        }
        if high == 0 {
            let floor = state.big_blind().min(seat.stack());
            options.push(ActionOption::bounded(ActionKind::Bet, floor, seat.stack()));
        }
        if high > 0 && ceiling > high && !seat.acted() {
            let floor = (high + state.min_raise()).min(ceiling);
            options.push(ActionOption::bounded(ActionKind::Raise, floor, ceiling));
        }
        options.push(ActionOption::bounded(ActionKind::AllIn, ceiling, ceiling));
        options
    }

    /// The action taken on a seat's behalf at timeout: check when free,
    /// otherwise fold.
    pub fn forced(state: &TableState, player: PlayerId) -> Action {
        let free = state
            .position_of(player)
            .map(|pos| state.seats()[pos].stake() == state.high_bet())
            .unwrap_or(false);
        match free {
            true => Action::Check,
            false => Action::Fold,
        }
    }
}
