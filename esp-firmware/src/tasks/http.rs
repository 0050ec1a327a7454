// HTTP Server Task (Betriebsmodus) - Steuer-UI und WebSocket-Hub
use core::future::pending;

use defmt::info;
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::{io::embedded_io_async, response::IntoResponse, response::ws, routing::get};

use crate::config::*;
use crate::web::{INDEX_HTML, STYLE_CSS};
use crate::{EventChannel, EventSubscriber, SharedOutput, SharedStore, log_event, output_state_label};

/// Response-Enum für den WebSocket-Endpoint
/// Ermöglicht Rückgabe von entweder WebSocket-Upgrade oder HTTP-Fehler
enum WebSocketResponse {
    Upgrade(
        ws::UpgradedWebSocket<ws::UnspecifiedProtocol, ws::CallbackNotUsingState<EventHubPeer>>,
    ),
    ServiceUnavailable,
}

impl IntoResponse for WebSocketResponse {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        match self {
            WebSocketResponse::Upgrade(ws) => ws.write_to(connection, response_writer).await,
            WebSocketResponse::ServiceUnavailable => {
                picoserve::response::Response::new(
                    picoserve::response::StatusCode::new(503),
                    "Service Unavailable: Too many WebSocket connections",
                )
                .with_header("Retry-After", "5")
                .write_to(connection, response_writer)
                .await
            }
        }
    }
}

/// Rendert index.html mit dem aktuellen Ausgangs-Zustand
///
/// Wird pro Request frisch gerendert - der %STATE%-Platzhalter bekommt
/// immer den Live-Zustand des Pins, nichts wird gecacht.
fn render_index(output: &'static SharedOutput) -> impl IntoResponse {
    let state = output_state_label(output);
    let mut html = alloc::string::String::with_capacity(INDEX_HTML.len() + 8);
    let _ = esp_core::render_state_template(&mut html, INDEX_HTML, state);
    picoserve::response::Response::new(picoserve::response::StatusCode::OK, html)
        .with_header("Content-Type", "text/html; charset=utf-8")
}

/// HTTP Server Task (Betriebsmodus) - läuft parallel zu anderen Tasks
///
/// Routen:
/// - GET /          → index.html mit eingesetztem Ausgangs-Zustand
/// - GET /on, /off  → Ausgang schalten, Log-Zeile broadcasten, index rendern
/// - GET /style.css → eingebettetes Stylesheet
/// - GET /log.txt   → komplette persistierte Logdatei
/// - GET /ws        → WebSocket-Upgrade in den Event-Hub
///
/// **Task Pool:** Diese Task wird 4x gespawnt für concurrent connections.
#[embassy_executor::task(pool_size = 4)]
pub async fn http_server_task(
    task_id: usize,
    stack: Stack<'static>,
    store: &'static SharedStore,
    output: &'static SharedOutput,
    events: &'static EventChannel,
) {
    info!("HTTP: Server task {} starting on port 80...", task_id);

    let app = picoserve::Router::new()
        .route(
            "/",
            get(move || async move { render_index(output) }),
        )
        .route(
            "/on",
            get(move || async move {
                output.lock(|output| output.borrow_mut().set_high());
                log_event(store, events, "LED ON");
                render_index(output)
            }),
        )
        .route(
            "/off",
            get(move || async move {
                output.lock(|output| output.borrow_mut().set_low());
                log_event(store, events, "LED OFF");
                render_index(output)
            }),
        )
        .route(
            "/style.css",
            get(|| async {
                picoserve::response::Response::new(picoserve::response::StatusCode::OK, STYLE_CSS)
                    .with_header("Content-Type", "text/css")
            }),
        )
        .route(
            "/log.txt",
            get(move || async move {
                let log = store.lock(|store| store.borrow_mut().read_log());
                picoserve::response::Response::new(picoserve::response::StatusCode::OK, log)
                    .with_header("Content-Type", "text/plain; charset=utf-8")
            }),
        )
        .route(
            "/ws",
            get(
                move |upgrade: picoserve::response::WebSocketUpgrade| async move {
                    info!("HTTP: WebSocket upgrade requested");

                    // Ein Peer belegt einen Subscriber-Slot; der Slot wird
                    // beim Schließen der Verbindung wieder frei. Sind alle
                    // Slots belegt, gibt es HTTP 503 statt Panic.
                    match events.subscriber() {
                        Ok(subscriber) => {
                            let peer = EventHubPeer {
                                store,
                                subscriber,
                            };
                            WebSocketResponse::Upgrade(upgrade.on_upgrade(peer))
                        }
                        Err(_) => {
                            info!("HTTP: No subscriber slots available, sending HTTP 503");
                            WebSocketResponse::ServiceUnavailable
                        }
                    }
                },
            ),
        );

    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    // HTTP-Buffer für Requests/Responses
    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];

    // TCP-Buffers für Socket
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Ein verbundener WebSocket-Peer des Event-Hubs
///
/// Empfängt alle Broadcasts (Zähler-Frames und Log-Zeilen) und dispatcht
/// eingehende Kommando-Texte. Bestätigungen gehen nur an diesen Peer,
/// Broadcasts an alle.
struct EventHubPeer {
    store: &'static SharedStore,
    subscriber: EventSubscriber,
}

impl ws::WebSocketCallback for EventHubPeer {
    async fn run<R: embedded_io_async::Read, W: embedded_io_async::Write<Error = R::Error>>(
        mut self,
        mut rx: ws::SocketRx<R>,
        mut tx: ws::SocketTx<W>,
    ) -> Result<(), W::Error> {
        info!("HTTP: WebSocket connection established");

        // Buffer für eingehende WebSocket-Nachrichten
        let mut buffer = [0u8; WEBSOCKET_BUFFER_SIZE];

        let close_reason = loop {
            // Gleichzeitig auf zwei Events lauschen mit embassy_futures::select:
            // 1. WebSocket-Messages vom Browser (Kommandos)
            // 2. Broadcasts vom Event-Channel
            //
            // next_message_pure überspringt verpasste Nachrichten
            // kommentarlos - Zustellung ist best-effort, ohne Ack.
            match select(
                rx.next_message(&mut buffer, pending()),
                self.subscriber.next_message_pure(),
            )
            .await
            {
                // WebSocket-Nachricht vom Browser empfangen
                Either::First(ws_result) => {
                    let ws_result = ws_result?.ignore_never_b();

                    match ws_result {
                        Ok(ws::Message::Text(text)) => {
                            info!("HTTP: WebSocket message: {}", text);

                            // Exakter String-Match; Unbekanntes wird ohne
                            // Antwort ignoriert
                            let reply = self.store.lock(|store| {
                                esp_core::dispatch_command(&mut *store.borrow_mut(), text)
                            });
                            if let Some(reply) = reply {
                                tx.send_text(reply).await?;
                            }
                        }
                        Ok(ws::Message::Binary(data)) => {
                            info!(
                                "HTTP: Received binary message: {} bytes (ignored)",
                                data.len()
                            );
                        }
                        Ok(ws::Message::Ping(data)) => {
                            tx.send_pong(data).await?;
                        }
                        Ok(ws::Message::Pong(_)) => {}
                        Ok(ws::Message::Close(_reason)) => {
                            info!("HTTP: WebSocket close received");
                            break None;
                        }
                        Err(error) => {
                            info!("HTTP: WebSocket error");
                            break Some((error.code(), "WebSocket Error"));
                        }
                    }
                }
                // Broadcast vom Event-Channel an diesen Peer weiterreichen
                Either::Second(line) => {
                    tx.send_text(line.as_str()).await?;
                }
            }
        };

        info!("HTTP: WebSocket connection closed");
        tx.close(close_reason).await
    }
}
