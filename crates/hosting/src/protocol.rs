use felt_core::Chips;
use felt_core::Millis;
use felt_gameplay::Action;
use felt_gameplay::GameEvent;
use serde_json::Value;
use serde_json::json;

/// Everything a client may send, tagged by `type`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "auth.login", rename_all = "camelCase")]
    AuthLogin { bot_id: String, api_key: String },
    #[serde(rename = "game.list")]
    GameList {},
    #[serde(rename = "game.join", rename_all = "camelCase")]
    GameJoin { game_id: String, chip_stack: Chips },
    #[serde(rename = "game.leave")]
    GameLeave {},
    #[serde(rename = "action.submit")]
    ActionSubmit { action: Action },
    #[serde(rename = "state.current")]
    StateCurrent {},
    #[serde(rename = "state.actions")]
    StateActions {},
}

impl ClientMessage {
    /// The request's wire tag, echoed in success and error replies.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AuthLogin { .. } => "auth.login",
            Self::GameList {} => "game.list",
            Self::GameJoin { .. } => "game.join",
            Self::GameLeave {} => "game.leave",
            Self::ActionSubmit { .. } => "action.submit",
            Self::StateCurrent {} => "state.current",
            Self::StateActions {} => "state.actions",
        }
    }
}

/// Outbound wire message builders. Every reply is a JSON object tagged by
/// `type`; successes merge the result fields at the top level.
pub struct Reply;

impl Reply {
    pub fn success(request: &str, result: Value) -> String {
        let mut message = match result {
            Value::Object(map) => Value::Object(map),
            other => json!({ "result": other }),
        };
        message["type"] = json!(format!("{}.success", request));
        message.to_string()
    }
    pub fn error(request: &str, code: &str, message: &str) -> String {
        json!({
            "type": format!("{}.error", request),
            "error": message,
            "code": code,
        })
        .to_string()
    }
    pub fn system_error(code: &str, message: &str) -> String {
        json!({ "type": "system.error", "code": code, "message": message }).to_string()
    }
    pub fn event(event: &GameEvent) -> String {
        json!({ "type": "event.game", "event": event }).to_string()
    }
    pub fn turn_start(time_limit_ms: Millis) -> String {
        json!({ "type": "turn.start", "timeLimit": time_limit_ms }).to_string()
    }
    pub fn turn_warning(time_remaining_ms: Millis) -> String {
        json!({ "type": "turn.warning", "timeRemaining": time_remaining_ms }).to_string()
    }
}
