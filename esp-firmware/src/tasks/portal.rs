// Provisioning Portal Task (AP-Modus) - Zugangsdaten-Formular
use defmt::info;
use embassy_net::Stack;
use embassy_time::{Duration, Timer};
use picoserve::routing::get;

use esp_core::ProvisionForm;

use crate::config::*;
use crate::web::{STYLE_CSS, WIFIMANAGER_HTML};
use crate::{RebootSignal, SharedStore};

/// Portal Server Task (AP-Modus) - nimmt die Netzwerk-Konfiguration entgegen
///
/// Routen:
/// - GET /          → wifimanager.html (Formular)
/// - POST /         → Formularfelder persistieren, Neustart anstoßen
/// - GET /style.css → eingebettetes Stylesheet
///
/// Nur übermittelte Felder werden geschrieben; ein fehlendes Feld lässt
/// den gespeicherten Wert unangetastet. Die Antwort geht raus, BEVOR der
/// Neustart ausgelöst wird - dafür sorgt die Karenzzeit im Reboot-Task.
///
/// **Task Pool:** Diese Task wird 2x gespawnt für concurrent connections.
#[embassy_executor::task(pool_size = 2)]
pub async fn portal_server_task(
    task_id: usize,
    stack: Stack<'static>,
    store: &'static SharedStore,
    reboot: &'static RebootSignal,
) {
    info!("Portal: Server task {} starting on port 80...", task_id);

    let app = picoserve::Router::new()
        .route(
            "/",
            get(|| async {
                picoserve::response::Response::new(
                    picoserve::response::StatusCode::OK,
                    WIFIMANAGER_HTML,
                )
                .with_header("Content-Type", "text/html; charset=utf-8")
            })
            .post(
                move |picoserve::extract::Form(form): picoserve::extract::Form<
                    ProvisionForm,
                >| async move {
                    info!("Portal: Configuration submitted");

                    store.lock(|store| {
                        esp_core::apply_submission(&mut *store.borrow_mut(), &form);
                    });

                    // Neustart erst nach der Karenzzeit, damit diese
                    // Antwort den Browser noch erreicht
                    reboot.signal(());

                    "Done. ESP will restart."
                },
            ),
        )
        .route(
            "/style.css",
            get(|| async {
                picoserve::response::Response::new(picoserve::response::StatusCode::OK, STYLE_CSS)
                    .with_header("Content-Type", "text/css")
            }),
        );

    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("Portal: Server task {} ended", task_id);
}

/// Wartet auf das Reboot-Signal aus dem Portal und startet das Gerät neu
///
/// Die Karenzzeit gibt dem Portal-Handler Zeit, seine Antwort über den
/// Socket zu schieben, bevor der Chip zurückgesetzt wird.
#[embassy_executor::task]
pub async fn reboot_task(reboot: &'static RebootSignal) {
    reboot.wait().await;
    info!("Portal: Restarting in {} seconds...", REBOOT_GRACE_SECS);
    Timer::after(Duration::from_secs(REBOOT_GRACE_SECS)).await;
    esp_hal::system::software_reset();
}
