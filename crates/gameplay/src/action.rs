use felt_core::Chips;

/// A player decision.
///
/// `Bet` carries the opening amount; `Raise` carries the raise-to total for
/// the round, not the increment. `Call` and `AllIn` carry no amount — the
/// engine computes what the seat actually owes and clamps to its stack.
///
/// # Wire form
///
/// Tagged by `type` with the strings `fold`, `check`, `call`, `bet`,
/// `raise`, `all-in`; `bet` and `raise` carry an `amount` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet { amount: Chips },
    Raise { amount: Chips },
    AllIn,
}

impl Action {
    /// True if this action opens or increases the round's high bet.
    pub fn is_aggressive(&self) -> bool {
        matches!(self, Action::Bet { .. } | Action::Raise { .. } | Action::AllIn)
    }
    /// The declared amount, if the action carries one.
    pub fn amount(&self) -> Option<Chips> {
        match *self {
            Action::Bet { amount } | Action::Raise { amount } => Some(amount),
            _ => None,
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Action::Fold => "fold",
            Action::Check => "check",
            Action::Call => "call",
            Action::Bet { .. } => "bet",
            Action::Raise { .. } => "raise",
            Action::AllIn => "all-in",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Bet { amount } => write!(f, "bet {}", amount),
            Action::Raise { amount } => write!(f, "raise {}", amount),
            other => write!(f, "{}", other.label()),
        }
    }
}
