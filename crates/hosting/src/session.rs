use crate::directory::BotDirectory;
use crate::directory::BotIdentity;
use crate::protocol::ClientMessage;
use crate::protocol::Reply;
use felt_core::Chips;
use felt_gameplay::Audience;
use felt_gameplay::GameId;
use felt_gameroom::Controller;
use felt_gameroom::ControllerError;
use felt_gameroom::Outbound;
use felt_gameroom::SubscriberId;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;

/// Where a session is in its lifecycle. Gates which messages it may send.
enum SessionState {
    Connected,
    Authenticated { bot: BotIdentity },
    Seated { bot: BotIdentity, game: GameId },
}

struct Subscription {
    game: GameId,
    id: SubscriberId,
    forwarder: JoinHandle<()>,
}

/// One client connection.
///
/// Messages are handled strictly in arrival order, which is what bounds a
/// seat to one in-flight `action.submit` per turn; the `inflight` flag
/// backstops that if a transport ever interleaves. Outbound traffic is
/// already projected for this seat by the room.
pub struct Session {
    controller: Arc<Controller>,
    directory: Arc<dyn BotDirectory>,
    outbound: UnboundedSender<String>,
    state: SessionState,
    subscription: Option<Subscription>,
    inflight: bool,
}

impl Session {
    pub fn new(
        controller: Arc<Controller>,
        directory: Arc<dyn BotDirectory>,
        outbound: UnboundedSender<String>,
    ) -> Self {
        Self {
            controller,
            directory,
            outbound,
            state: SessionState::Connected,
            subscription: None,
            inflight: false,
        }
    }

    /// Parses and dispatches one inbound frame.
    pub async fn handle(&mut self, text: &str) {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                self.send(Reply::system_error("MALFORMED_MESSAGE", &e.to_string()));
                return;
            }
        };
        let tag = message.tag();
        match message {
            ClientMessage::AuthLogin { bot_id, api_key } => self.login(tag, bot_id, api_key).await,
            ClientMessage::GameList {} => self.list(tag).await,
            ClientMessage::GameJoin {
                game_id,
                chip_stack,
            } => self.join(tag, game_id, chip_stack).await,
            ClientMessage::GameLeave {} => self.leave(tag).await,
            ClientMessage::ActionSubmit { action } => self.submit(tag, action).await,
            ClientMessage::StateCurrent {} => self.state_current(tag).await,
            ClientMessage::StateActions {} => self.state_actions(tag).await,
        }
    }

    /// The socket dropped. The seat stays: mid-hand it will be force-acted
    /// on timeout, and the bot can log back in and rejoin its game.
    pub async fn disconnect(&mut self) {
        self.detach();
        log::debug!("[session] disconnected");
    }
}

/// Message handlers.
impl Session {
    async fn login(&mut self, tag: &str, bot_id: String, api_key: String) {
        if !matches!(self.state, SessionState::Connected) {
            self.send(Reply::error(tag, "PRECONDITION_FAILED", "already authenticated"));
            return;
        }
        match self.directory.verify(&bot_id, &api_key).await {
            Some(bot) => {
                log::info!("[session] {} authenticated as {}", bot.id, bot.name);
                self.send(Reply::success(
                    tag,
                    json!({ "botId": bot.id, "name": bot.name }),
                ));
                self.state = SessionState::Authenticated { bot };
            }
            None => self.send(Reply::error(tag, "AUTH_INVALID", "unknown bot or bad key")),
        }
    }

    async fn list(&mut self, tag: &str) {
        if !matches!(self.state, SessionState::Authenticated { .. }) {
            self.reject_for_state(tag);
            return;
        }
        let games = self.controller.list_games().await;
        self.send(Reply::success(tag, json!({ "games": games })));
    }

    async fn join(&mut self, tag: &str, game_id: String, chip_stack: Chips) {
        let bot = match &self.state {
            SessionState::Authenticated { bot } => bot.clone(),
            _ => return self.reject_for_state(tag),
        };
        let Ok(game) = game_id.parse::<GameId>() else {
            return self.send(Reply::error(tag, "GAME_NOT_FOUND", "no such game"));
        };
        let result = self
            .controller
            .join_game(game, bot.id, bot.name.clone(), chip_stack)
            .await;
        match result {
            Ok(()) => {
                self.attach(game, &bot).await;
                self.state = SessionState::Seated { bot, game };
                self.send(Reply::success(tag, json!({ "gameId": game })));
            }
            // the seat is already at this table: a reconnecting bot
            // reattaches rather than being turned away
            Err(ControllerError::AlreadyInGame)
                if self.controller.seat_of(bot.id) == Some(game) =>
            {
                self.attach(game, &bot).await;
                self.state = SessionState::Seated { bot, game };
                self.send(Reply::success(tag, json!({ "gameId": game, "rejoined": true })));
            }
            Err(e) => self.send(Reply::error(tag, e.code(), &e.to_string())),
        }
    }

    async fn leave(&mut self, tag: &str) {
        let (bot, game) = match &self.state {
            SessionState::Seated { bot, game } => (bot.clone(), *game),
            _ => return self.reject_for_state(tag),
        };
        match self.controller.request_unseat(game, bot.id).await {
            Ok(()) => {
                self.detach();
                self.state = SessionState::Authenticated { bot };
                self.send(Reply::success(tag, json!({})));
            }
            Err(e) => self.send(Reply::error(tag, e.code(), &e.to_string())),
        }
    }

    async fn submit(&mut self, tag: &str, action: felt_gameplay::Action) {
        let bot = match &self.state {
            SessionState::Seated { bot, .. } => bot.clone(),
            _ => return self.reject_for_state(tag),
        };
        if self.inflight {
            return self.send(Reply::error(tag, "RATE_LIMITED", "an action is in flight"));
        }
        self.inflight = true;
        let result = self.controller.submit_action(bot.id, action).await;
        self.inflight = false;
        match result {
            Ok(()) => self.send(Reply::success(tag, json!({}))),
            Err(e) => self.send(Reply::error(tag, e.code(), &e.to_string())),
        }
    }

    async fn state_current(&mut self, tag: &str) {
        let bot = match &self.state {
            SessionState::Seated { bot, .. } => bot.clone(),
            _ => return self.reject_for_state(tag),
        };
        match self.controller.snapshot(bot.id).await {
            Ok(view) => match serde_json::to_value(&*view) {
                Ok(value) => self.send(Reply::success(tag, value)),
                Err(e) => self.send(Reply::error(tag, "INTERNAL", &e.to_string())),
            },
            Err(e) => self.send(Reply::error(tag, e.code(), &e.to_string())),
        }
    }

    async fn state_actions(&mut self, tag: &str) {
        let bot = match &self.state {
            SessionState::Seated { bot, .. } => bot.clone(),
            _ => return self.reject_for_state(tag),
        };
        match self.controller.snapshot(bot.id).await {
            Ok(view) => self.send(Reply::success(
                tag,
                json!({ "possibleActions": view.possible_actions }),
            )),
            Err(e) => self.send(Reply::error(tag, e.code(), &e.to_string())),
        }
    }
}

/// Subscription plumbing.
impl Session {
    /// Subscribes to the table's stream and forwards it, serialized, to
    /// the socket. Everything arriving here was projected for this seat.
    async fn attach(&mut self, game: GameId, bot: &BotIdentity) {
        self.detach();
        let (tx, mut rx) = unbounded_channel::<Outbound>();
        let id = match self
            .controller
            .subscribe(game, Audience::Seat(bot.id), tx)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                log::warn!("[session] subscribe to {} failed: {}", game, e);
                return;
            }
        };
        let outbound = self.outbound.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let frame = match message {
                    Outbound::Event(event) => Reply::event(&event),
                    Outbound::TurnStart { time_limit_ms, .. } => Reply::turn_start(time_limit_ms),
                    Outbound::TurnWarning {
                        time_remaining_ms, ..
                    } => Reply::turn_warning(time_remaining_ms),
                    Outbound::Terminal { code, message } => Reply::system_error(code, &message),
                };
                if outbound.send(frame).is_err() {
                    break;
                }
            }
        });
        self.subscription = Some(Subscription {
            game,
            id,
            forwarder,
        });
    }
    fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.controller
                .unsubscribe(subscription.game, subscription.id);
            subscription.forwarder.abort();
        }
    }
    fn reject_for_state(&self, tag: &str) {
        let reply = match self.state {
            SessionState::Connected => Reply::error(tag, "AUTH_REQUIRED", "authenticate first"),
            SessionState::Authenticated { .. } => {
                Reply::error(tag, "PRECONDITION_FAILED", "join a game first")
            }
            SessionState::Seated { .. } => {
                Reply::error(tag, "PRECONDITION_FAILED", "not available while seated")
            }
        };
        self.send(reply);
    }
    fn send(&self, frame: String) {
        let _ = self.outbound.send(frame);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use felt_gameplay::GameConfig;
    use felt_records::RecorderService;
    use felt_records::ReplayRecorder;
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    struct Harness {
        controller: Arc<Controller>,
        directory: Arc<MemoryDirectory>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                controller: Arc::new(Controller::new(RecorderService::spawn(
                    ReplayRecorder::default(),
                ))),
                directory: Arc::new(MemoryDirectory::new()),
            }
        }
        fn session(&self) -> (Session, UnboundedReceiver<String>) {
            let (tx, rx) = unbounded_channel();
            (
                Session::new(self.controller.clone(), self.directory.clone(), tx),
                rx,
            )
        }
        fn game(&self, config: GameConfig) -> GameId {
            let id = GameId::default();
            self.controller.create_game(id, config).unwrap();
            id
        }
    }

    async fn next(rx: &mut UnboundedReceiver<String>) -> Value {
        let frame = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("frame in time")
            .expect("channel open");
        serde_json::from_str(&frame).unwrap()
    }

    async fn next_of(rx: &mut UnboundedReceiver<String>, wanted: &str) -> Value {
        loop {
            let value = next(rx).await;
            if value["type"] == wanted {
                return value;
            }
        }
    }

    async fn login(session: &mut Session, rx: &mut UnboundedReceiver<String>, id: &str, key: &str) {
        session
            .handle(&json!({ "type": "auth.login", "botId": id, "apiKey": key }).to_string())
            .await;
        let reply = next(rx).await;
        assert_eq!(reply["type"], "auth.login.success");
    }

    #[tokio::test]
    async fn everything_requires_auth_first() {
        let harness = Harness::new();
        let (mut session, mut rx) = harness.session();
        session.handle(r#"{"type":"game.list"}"#).await;
        let reply = next(&mut rx).await;
        assert_eq!(reply["type"], "game.list.error");
        assert_eq!(reply["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn malformed_frames_get_a_system_error() {
        let harness = Harness::new();
        let (mut session, mut rx) = harness.session();
        session.handle("{{{{").await;
        let reply = next(&mut rx).await;
        assert_eq!(reply["type"], "system.error");
        assert_eq!(reply["code"], "MALFORMED_MESSAGE");
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let harness = Harness::new();
        let (id, _key) = harness.directory.register("prober");
        let (mut session, mut rx) = harness.session();
        session
            .handle(
                &json!({ "type": "auth.login", "botId": id.to_string(), "apiKey": "nope" })
                    .to_string(),
            )
            .await;
        let reply = next(&mut rx).await;
        assert_eq!(reply["type"], "auth.login.error");
        assert_eq!(reply["code"], "AUTH_INVALID");
    }

    #[tokio::test]
    async fn seated_messages_require_a_seat() {
        let harness = Harness::new();
        let (id, key) = harness.directory.register("prober");
        let (mut session, mut rx) = harness.session();
        login(&mut session, &mut rx, &id.to_string(), &key).await;
        session
            .handle(r#"{"type":"action.submit","action":{"type":"fold"}}"#)
            .await;
        let reply = next(&mut rx).await;
        assert_eq!(reply["type"], "action.submit.error");
        assert_eq!(reply["code"], "PRECONDITION_FAILED");
    }

    #[tokio::test]
    async fn join_streams_events_with_only_own_hole_cards() {
        let harness = Harness::new();
        let game = harness.game(GameConfig {
            hand_start_delay: 20,
            rng_seed: Some(77),
            ..GameConfig::default()
        });
        let (id_a, key_a) = harness.directory.register("alice-bot");
        let (id_b, key_b) = harness.directory.register("bob-bot");
        let (mut session_a, mut rx_a) = harness.session();
        login(&mut session_a, &mut rx_a, &id_a.to_string(), &key_a).await;
        session_a
            .handle(
                &json!({ "type": "game.join", "gameId": game.to_string(), "chipStack": 1000 })
                    .to_string(),
            )
            .await;
        assert_eq!(next(&mut rx_a).await["type"], "game.join.success");
        let (mut session_b, mut rx_b) = harness.session();
        login(&mut session_b, &mut rx_b, &id_b.to_string(), &key_b).await;
        session_b
            .handle(
                &json!({ "type": "game.join", "gameId": game.to_string(), "chipStack": 1000 })
                    .to_string(),
            )
            .await;
        assert_eq!(next(&mut rx_b).await["type"], "game.join.success");
        // the hand auto-starts; hole cards reach each seat filtered
        let frame = loop {
            let value = next_of(&mut rx_a, "event.game").await;
            if value["event"]["type"] == "hole_cards_dealt" {
                break value;
            }
        };
        let seats = frame["event"]["snapshot"]["seats"].as_array().unwrap();
        let visible: Vec<&Value> = seats
            .iter()
            .filter(|s| s.get("holeCards").is_some())
            .collect();
        assert_eq!(visible.len(), 1, "exactly one hand visible per seat");
        assert_eq!(visible[0]["id"], json!(id_a));
    }

    #[tokio::test]
    async fn state_current_carries_possible_actions_when_on_the_clock() {
        let harness = Harness::new();
        let game = harness.game(GameConfig {
            hand_start_delay: 20,
            rng_seed: Some(5),
            ..GameConfig::default()
        });
        let (id_a, key_a) = harness.directory.register("a");
        let (id_b, key_b) = harness.directory.register("b");
        let (mut session_a, mut rx_a) = harness.session();
        let (mut session_b, mut rx_b) = harness.session();
        login(&mut session_a, &mut rx_a, &id_a.to_string(), &key_a).await;
        login(&mut session_b, &mut rx_b, &id_b.to_string(), &key_b).await;
        for (session, rx) in [(&mut session_a, &mut rx_a), (&mut session_b, &mut rx_b)] {
            session
                .handle(
                    &json!({ "type": "game.join", "gameId": game.to_string(), "chipStack": 500 })
                        .to_string(),
                )
                .await;
            assert_eq!(next(rx).await["type"], "game.join.success");
        }
        // whoever receives turn.start is on the clock
        let (on_clock, rx) = tokio::select! {
            v = next_of(&mut rx_a, "turn.start") => { let _ = v; (&mut session_a, &mut rx_a) }
            v = next_of(&mut rx_b, "turn.start") => { let _ = v; (&mut session_b, &mut rx_b) }
        };
        on_clock.handle(r#"{"type":"state.current"}"#).await;
        let reply = next_of(rx, "state.current.success").await;
        let actions = reply["possibleActions"].as_array().unwrap();
        assert!(!actions.is_empty());
        assert!(reply["timeRemainingMs"].as_u64().is_some());
    }

    #[tokio::test]
    async fn disconnect_keeps_the_seat_and_rejoin_reattaches() {
        let harness = Harness::new();
        let game = harness.game(GameConfig {
            hand_start_delay: 20,
            rng_seed: Some(9),
            ..GameConfig::default()
        });
        let (id_a, key_a) = harness.directory.register("flaky");
        let (id_b, key_b) = harness.directory.register("steady");
        let (mut session_a, mut rx_a) = harness.session();
        let (mut session_b, mut rx_b) = harness.session();
        login(&mut session_a, &mut rx_a, &id_a.to_string(), &key_a).await;
        login(&mut session_b, &mut rx_b, &id_b.to_string(), &key_b).await;
        for (session, rx) in [(&mut session_a, &mut rx_a), (&mut session_b, &mut rx_b)] {
            session
                .handle(
                    &json!({ "type": "game.join", "gameId": game.to_string(), "chipStack": 500 })
                        .to_string(),
                )
                .await;
            assert_eq!(next(rx).await["type"], "game.join.success");
        }
        next_of(&mut rx_a, "event.game").await;
        // the socket drops mid-hand; the seat stays in the game
        session_a.disconnect().await;
        assert_eq!(harness.controller.seat_of(id_a), Some(game));
        // a fresh session logs in and reattaches to the same seat
        let (mut session_a2, mut rx_a2) = harness.session();
        login(&mut session_a2, &mut rx_a2, &id_a.to_string(), &key_a).await;
        session_a2
            .handle(
                &json!({ "type": "game.join", "gameId": game.to_string(), "chipStack": 500 })
                    .to_string(),
            )
            .await;
        let reply = next(&mut rx_a2).await;
        assert_eq!(reply["type"], "game.join.success");
        assert_eq!(reply["rejoined"], true);
    }
}
