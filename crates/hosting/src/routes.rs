//! Actix entry points bridging WebSocket traffic to sessions.
use crate::directory::BotDirectory;
use crate::protocol::Reply;
use crate::session::Session;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use felt_gameroom::Controller;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

/// A connection that sends nothing for this long is timed out and closed.
/// Seated bots are unaffected beyond the socket: the seat stays and is
/// force-acted by the turn clock.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared server state handed to every connection.
pub struct AppState {
    pub controller: Arc<Controller>,
    pub directory: Arc<dyn BotDirectory>,
}

/// Upgrades `/ws` and pumps frames between the socket and the session.
/// One task per connection; inbound frames are handled strictly in order.
pub async fn ws(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, mut socket, mut frames) = actix_ws::handle(&req, stream)?;
    let (out_tx, mut out_rx) = unbounded_channel::<String>();
    let mut session = Session::new(data.controller.clone(), data.directory.clone(), out_tx);
    log::debug!("[ws] connected");
    actix_web::rt::spawn(async move {
        use futures::StreamExt;
        'sesh: loop {
            tokio::select! {
                biased;
                msg = out_rx.recv() => match msg {
                    Some(json) => if socket.text(json).await.is_err() { break 'sesh },
                    None => break 'sesh,
                },
                msg = tokio::time::timeout(IDLE_TIMEOUT, frames.next()) => match msg {
                    Err(_) => {
                        let _ = socket
                            .text(Reply::system_error("TIMEOUT", "idle session closed"))
                            .await;
                        break 'sesh;
                    }
                    Ok(Some(Ok(actix_ws::Message::Text(text)))) => session.handle(&text).await,
                    Ok(Some(Ok(actix_ws::Message::Ping(bytes)))) => {
                        if socket.pong(&bytes).await.is_err() { break 'sesh }
                    }
                    Ok(Some(Ok(actix_ws::Message::Close(_)))) => break 'sesh,
                    Ok(Some(Err(_))) => break 'sesh,
                    Ok(None) => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        session.disconnect().await;
        log::debug!("[ws] disconnected");
    });
    Ok(response)
}

/// Liveness probe.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}
