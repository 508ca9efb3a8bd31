//! Bot poker server.
//!
//! Wires the table fleet, the replay recorder, and the WebSocket session
//! layer into a single actix-web server. The HTTP surface is deliberately
//! small: `/ws` for bot sessions and `/health` for probes; administration
//! lives elsewhere.
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use felt_gameplay::GameConfig;
use felt_gameplay::GameId;
use felt_gameroom::Controller;
use felt_hosting::BotDirectory;
use felt_hosting::MemoryDirectory;
use felt_hosting::routes;
use felt_records::RecorderService;
use felt_records::ReplayRecorder;
use std::sync::Arc;

/// Runtime options for one server process.
#[derive(Debug, clap::Parser)]
#[command(name = "felt-server", about = "No-limit hold'em server for bots")]
pub struct Args {
    /// Address to bind, e.g. 127.0.0.1:8080.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,
    /// Open a demo table and print credentials for two throwaway bots.
    #[arg(long)]
    pub demo: bool,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let recorder = RecorderService::spawn(ReplayRecorder::default());
    let controller = Arc::new(Controller::new(recorder));
    let directory = Arc::new(MemoryDirectory::new());
    if args.demo {
        demo(&controller, &directory)?;
    }
    let state = web::Data::new(routes::AppState {
        controller,
        directory: directory as Arc<dyn BotDirectory>,
    });
    log::info!("listening on {}", args.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .route("/health", web::get().to(routes::health))
            .route("/ws", web::get().to(routes::ws))
    })
    .bind(&args.bind)?
    .run()
    .await?;
    Ok(())
}

/// Creates one table with defaults and two registered bots so a checkout
/// can be played against immediately.
fn demo(controller: &Controller, directory: &MemoryDirectory) -> anyhow::Result<()> {
    let game = GameId::default();
    controller
        .create_game(game, GameConfig::default())
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    log::info!("demo table: {}", game);
    for name in ["demo-bot-1", "demo-bot-2"] {
        let (id, key) = directory.register(name);
        log::info!("{}: botId={} apiKey={}", name, id, key);
    }
    Ok(())
}
