use crate::command::Command;
use crate::command::GameInfo;
use crate::command::Outbound;
use crate::command::SubscriberId;
use crate::registry::ControllerError;
use crate::registry::Registry;
use crate::registry::RoomHandle;
use crate::room::Room;
use felt_core::Chips;
use felt_gameplay::Action;
use felt_gameplay::Audience;
use felt_gameplay::BotView;
use felt_gameplay::GameConfig;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use felt_records::RecorderHandle;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Owns the fleet of tables.
///
/// The game map and seat map live under one coarse lock, consulted only on
/// session boundary transitions; gameplay traffic goes straight to the
/// owning room's queue. Rooms tear themselves down when empty; a watcher
/// task per room reconciles the maps afterwards.
pub struct Controller {
    registry: Arc<Mutex<Registry>>,
    recorder: RecorderHandle,
}

impl Controller {
    pub fn new(recorder: RecorderHandle) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            recorder,
        }
    }
    pub fn recorder(&self) -> &RecorderHandle {
        &self.recorder
    }

    /// Opens a table. Must run inside a tokio runtime; the room task is
    /// spawned here.
    pub fn create_game(&self, id: GameId, config: GameConfig) -> Result<(), ControllerError> {
        let mut registry = self.registry.lock().expect("registry lock");
        if registry.games.contains_key(&id) {
            return Err(ControllerError::Duplicate);
        }
        let handle = Room::spawn(id, config, self.registry.clone(), self.recorder.clone());
        registry.games.insert(id, handle);
        log::info!("[controller] created game {}", id);
        Ok(())
    }

    /// Tears a table down: the room flushes its replay, cancels timers,
    /// and detaches subscribers as it exits.
    pub fn remove_game(&self, id: GameId) -> Result<(), ControllerError> {
        let mut registry = self.registry.lock().expect("registry lock");
        let handle = registry.games.remove(&id).ok_or(ControllerError::GameNotFound)?;
        registry.seats.retain(|_, game| *game != id);
        let _ = handle.tx.send(Command::Shutdown);
        log::info!("[controller] removed game {}", id);
        Ok(())
    }

    /// Seats a player, enforcing one table per seat fleet-wide.
    pub async fn join_game(
        &self,
        game: GameId,
        player: PlayerId,
        name: String,
        chips: Chips,
    ) -> Result<(), ControllerError> {
        let tx = {
            let mut registry = self.registry.lock().expect("registry lock");
            if registry.seats.contains_key(&player) {
                return Err(ControllerError::AlreadyInGame);
            }
            let tx = registry.games.get(&game).ok_or(ControllerError::GameNotFound)?.tx.clone();
            // claim the seat before releasing the lock so a concurrent
            // join of the same player races here, not in the rooms
            registry.seats.insert(player, game);
            tx
        };
        let result = call(&tx, |reply| Command::Join {
            player,
            name,
            chips,
            reply,
        })
        .await
        .and_then(|r| r.map_err(ControllerError::from));
        if result.is_err() {
            self.registry
                .lock()
                .expect("registry lock")
                .release_seat(player, game);
        }
        result
    }

    /// Requests an unseat: immediate between hands, queued mid-hand.
    pub async fn request_unseat(
        &self,
        game: GameId,
        player: PlayerId,
    ) -> Result<(), ControllerError> {
        let tx = self.room_of_seat(game, player)?;
        call(&tx, |reply| Command::Leave { player, reply })
            .await
            .and_then(|r| r.map_err(ControllerError::from))
    }

    /// Starts a hand now, subject to the table's start policy.
    pub async fn start_game(
        &self,
        game: GameId,
        requester: Option<PlayerId>,
    ) -> Result<(), ControllerError> {
        let tx = self.room_tx(game)?;
        call(&tx, |reply| Command::Start { requester, reply })
            .await
            .and_then(|r| r.map_err(ControllerError::from))
    }

    /// Routes a seat's action to its table.
    pub async fn submit_action(
        &self,
        player: PlayerId,
        action: Action,
    ) -> Result<(), ControllerError> {
        let game = self.seat_of(player).ok_or(ControllerError::UnknownSeat)?;
        let tx = self.room_tx(game)?;
        call(&tx, |reply| Command::Act {
            player,
            action,
            reply,
        })
        .await
        .and_then(|r| r.map_err(ControllerError::from))
    }

    /// The per-seat projection with the live turn budget.
    pub async fn snapshot(&self, player: PlayerId) -> Result<Box<BotView>, ControllerError> {
        let game = self.seat_of(player).ok_or(ControllerError::UnknownSeat)?;
        let tx = self.room_tx(game)?;
        call(&tx, |reply| Command::Snapshot { player, reply }).await
    }

    /// Attaches an outbound channel to a table's event stream.
    pub async fn subscribe(
        &self,
        game: GameId,
        audience: Audience,
        sender: UnboundedSender<Outbound>,
    ) -> Result<SubscriberId, ControllerError> {
        let tx = self.room_tx(game)?;
        call(&tx, |reply| Command::Subscribe {
            audience,
            sender,
            reply,
        })
        .await
    }

    pub fn unsubscribe(&self, game: GameId, id: SubscriberId) {
        if let Ok(tx) = self.room_tx(game) {
            let _ = tx.send(Command::Unsubscribe { id });
        }
    }

    /// Listing of every table, queried live.
    pub async fn list_games(&self) -> Vec<GameInfo> {
        let handles: Vec<RoomHandle> = {
            let registry = self.registry.lock().expect("registry lock");
            registry.games.values().cloned().collect()
        };
        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(info) = call(&handle.tx, |reply| Command::Info { reply }).await {
                infos.push(info);
            }
        }
        infos
    }

    /// Which table a seat is at, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<GameId> {
        self.registry
            .lock()
            .expect("registry lock")
            .seats
            .get(&player)
            .copied()
    }

    fn room_tx(&self, game: GameId) -> Result<UnboundedSender<Command>, ControllerError> {
        self.registry
            .lock()
            .expect("registry lock")
            .games
            .get(&game)
            .map(|h| h.tx.clone())
            .ok_or(ControllerError::GameNotFound)
    }
    fn room_of_seat(
        &self,
        game: GameId,
        player: PlayerId,
    ) -> Result<UnboundedSender<Command>, ControllerError> {
        let registry = self.registry.lock().expect("registry lock");
        if registry.seats.get(&player) != Some(&game) {
            return Err(ControllerError::UnknownSeat);
        }
        registry
            .games
            .get(&game)
            .map(|h| h.tx.clone())
            .ok_or(ControllerError::GameNotFound)
    }
}

/// Sends a command and awaits its reply; a dead room reads as a missing
/// game.
async fn call<T>(
    tx: &UnboundedSender<Command>,
    make: impl FnOnce(oneshot::Sender<T>) -> Command,
) -> Result<T, ControllerError> {
    let (reply, rx) = oneshot::channel();
    tx.send(make(reply))
        .map_err(|_| ControllerError::GameNotFound)?;
    rx.await.map_err(|_| ControllerError::GameNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use felt_gameplay::EngineError;
    use felt_gameplay::EventKind;
    use felt_gameplay::StartSettings;
    use felt_records::RecorderService;
    use felt_records::ReplayRecorder;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::timeout;

    fn controller() -> Controller {
        Controller::new(RecorderService::spawn(ReplayRecorder::default()))
    }

    fn config() -> GameConfig {
        GameConfig {
            hand_start_delay: 20,
            rng_seed: Some(42),
            ..GameConfig::default()
        }
    }

    async fn next_event(rx: &mut UnboundedReceiver<Outbound>) -> Outbound {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    async fn wait_for_kind(rx: &mut UnboundedReceiver<Outbound>, kind: EventKind) {
        loop {
            if let Outbound::Event(event) = next_event(rx).await {
                if event.kind == kind {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn game_lifecycle_errors() {
        let controller = controller();
        let id = GameId::default();
        controller.create_game(id, config()).unwrap();
        assert_eq!(
            controller.create_game(id, config()),
            Err(ControllerError::Duplicate)
        );
        assert_eq!(
            controller.remove_game(GameId::default()),
            Err(ControllerError::GameNotFound)
        );
        controller.remove_game(id).unwrap();
        assert_eq!(
            controller
                .join_game(id, PlayerId::default(), "late".into(), 500)
                .await,
            Err(ControllerError::GameNotFound)
        );
    }

    #[tokio::test]
    async fn a_seat_lives_in_at_most_one_table() {
        let controller = controller();
        let (a, b) = (GameId::default(), GameId::default());
        controller.create_game(a, config()).unwrap();
        controller.create_game(b, config()).unwrap();
        let player = PlayerId::default();
        controller
            .join_game(a, player, "bot".into(), 1_000)
            .await
            .unwrap();
        assert_eq!(
            controller.join_game(b, player, "bot".into(), 1_000).await,
            Err(ControllerError::AlreadyInGame)
        );
        assert_eq!(controller.seat_of(player), Some(a));
    }

    #[tokio::test]
    async fn auto_start_deals_when_min_players_seated() {
        let controller = controller();
        let id = GameId::default();
        controller.create_game(id, config()).unwrap();
        let (tx, mut rx) = unbounded_channel();
        controller
            .subscribe(id, Audience::Spectator, tx)
            .await
            .unwrap();
        controller
            .join_game(id, PlayerId::default(), "a".into(), 1_000)
            .await
            .unwrap();
        controller
            .join_game(id, PlayerId::default(), "b".into(), 1_000)
            .await
            .unwrap();
        wait_for_kind(&mut rx, EventKind::HandStarted).await;
        wait_for_kind(&mut rx, EventKind::BlindsPosted).await;
    }

    #[tokio::test]
    async fn manual_start_checks_the_creator() {
        let creator = PlayerId::default();
        let stranger = PlayerId::default();
        let controller = controller();
        let id = GameId::default();
        let config = GameConfig {
            start_settings: StartSettings::Manual {
                creator: Some(creator),
            },
            ..config()
        };
        controller.create_game(id, config).unwrap();
        controller
            .join_game(id, creator, "owner".into(), 1_000)
            .await
            .unwrap();
        controller
            .join_game(id, stranger, "guest".into(), 1_000)
            .await
            .unwrap();
        assert!(matches!(
            controller.start_game(id, Some(stranger)).await,
            Err(ControllerError::Engine(EngineError::PreconditionFailed(_)))
        ));
        controller.start_game(id, Some(creator)).await.unwrap();
    }

    #[tokio::test]
    async fn turn_timeout_force_acts_and_late_action_is_rejected() {
        let controller = controller();
        let id = GameId::default();
        let mut config = config();
        config.turn_time_limit = 1;
        config.start_settings = StartSettings::Manual { creator: None };
        // keep the next hand from dealing while we assert on this one
        config.hand_start_delay = 60_000;
        controller.create_game(id, config).unwrap();
        let (a, b) = (PlayerId::default(), PlayerId::default());
        controller.join_game(id, a, "a".into(), 1_000).await.unwrap();
        controller.join_game(id, b, "b".into(), 1_000).await.unwrap();
        // each seat listens on its own projected stream
        let (tx_a, mut rx_a) = unbounded_channel();
        controller
            .subscribe(id, Audience::Seat(a), tx_a)
            .await
            .unwrap();
        let (tx_b, mut rx_b) = unbounded_channel();
        controller
            .subscribe(id, Audience::Seat(b), tx_b)
            .await
            .unwrap();
        controller.start_game(id, None).await.unwrap();
        // find who is on the clock from the turn.start notice
        let mut on_clock = None;
        for rx in [&mut rx_a, &mut rx_b] {
            loop {
                match timeout(Duration::from_secs(2), rx.recv()).await {
                    Ok(Some(Outbound::TurnStart { seat, .. })) => {
                        on_clock = Some(seat);
                        break;
                    }
                    Ok(Some(_)) => continue,
                    _ => break,
                }
            }
            if on_clock.is_some() {
                break;
            }
        }
        let actor = on_clock.expect("someone is on the clock");
        let (actor_rx, _other_rx) = if actor == a {
            (&mut rx_a, &mut rx_b)
        } else {
            (&mut rx_b, &mut rx_a)
        };
        // the warning lands before the timeout
        let mut saw_warning = false;
        loop {
            match timeout(Duration::from_secs(3), actor_rx.recv())
                .await
                .expect("stream alive")
                .expect("channel open")
            {
                Outbound::TurnWarning { seat, .. } => {
                    assert_eq!(seat, actor);
                    saw_warning = true;
                }
                Outbound::Event(event) if event.kind == EventKind::PlayerTimeout => {
                    assert!(saw_warning, "warning precedes timeout");
                    break;
                }
                _ => continue,
            }
        }
        // the forced action already resolved the turn; a late submit from
        // the timed-out seat is rejected
        let result = controller.submit_action(actor, Action::Call).await;
        assert!(matches!(
            result,
            Err(ControllerError::Engine(EngineError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn mid_hand_unseat_is_queued_until_hand_end() {
        let controller = controller();
        let id = GameId::default();
        let mut config = config();
        config.start_settings = StartSettings::Manual { creator: None };
        controller.create_game(id, config).unwrap();
        let (a, b, c) = (PlayerId::default(), PlayerId::default(), PlayerId::default());
        for (player, name) in [(a, "a"), (b, "b"), (c, "c")] {
            controller
                .join_game(id, player, name.into(), 1_000)
                .await
                .unwrap();
        }
        let (tx, mut rx) = unbounded_channel();
        controller.subscribe(id, Audience::Spectator, tx).await.unwrap();
        controller.start_game(id, None).await.unwrap();
        wait_for_kind(&mut rx, EventKind::HandStarted).await;
        // leaving mid-hand keeps the seat playing until the hand ends
        controller.request_unseat(id, a).await.unwrap();
        assert_eq!(controller.seat_of(a), Some(id));
        // fold the hand out
        loop {
            let view = match controller.snapshot(a).await {
                Ok(view) => view,
                Err(_) => break,
            };
            let Some(actor) = view.view.current_player_to_act else {
                break;
            };
            let action = if view
                .view
                .seats
                .iter()
                .find(|s| s.id == actor)
                .map(|s| s.current_bet)
                == Some(view.view.seats.iter().map(|s| s.current_bet).max().unwrap_or(0))
            {
                Action::Check
            } else {
                Action::Fold
            };
            if controller.submit_action(actor, action).await.is_err() {
                break;
            }
        }
        wait_for_kind(&mut rx, EventKind::HandComplete).await;
        wait_for_kind(&mut rx, EventKind::PlayerLeft).await;
        // the queued unseat has been applied and the seat released
        timeout(Duration::from_secs(2), async {
            while controller.seat_of(a).is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("seat released");
    }
}
