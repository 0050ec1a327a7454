// WiFi Tasks - Station-Bootstrap, Access Point und Netzwerk-Runner
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use esp_radio::wifi::{AccessPointConfig, ClientConfig, ModeConfig, WifiController, WifiDevice};

use esp_core::{ConnectPoll, ConnectionAttempt, NetworkProfile};

use crate::config::{AP_SSID, WIFI_CONNECT_POLL_MS, WIFI_CONNECT_TIMEOUT_MS};

/// Monotone Millisekunden für die Deadline-Logik in esp-core
fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Einmaliger Station-Verbindungsversuch mit Deadline
///
/// Blockiert den Aufrufer bis zum Erfolg oder Timeout (max. 10 s) - das
/// ist der akzeptierte Boot-Stillstand, kein Dauerzustand. Kein Retry:
/// `false` heißt, der Aufrufer startet das Provisioning-Portal.
///
/// Bei unbrauchbarem Profil (SSID oder IP leer) wird sofort `false`
/// geliefert, ohne die Hardware anzufassen.
pub async fn connect_station(
    controller: &mut WifiController<'static>,
    stack: Stack<'static>,
    profile: &NetworkProfile,
) -> bool {
    let Some(attempt) = ConnectionAttempt::begin(profile, now_ms(), WIFI_CONNECT_TIMEOUT_MS)
    else {
        info!("WiFi: Undefined SSID or IP address, skipping connect");
        return false;
    };

    info!("WiFi: Connecting to '{}'...", profile.ssid.as_str());

    let client_config = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(profile.ssid.as_str().into())
            .with_password(profile.pass.as_str().into()),
    );

    if let Err(e) = controller.set_config(&client_config) {
        error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
        return false;
    }

    if let Err(e) = controller.start_async().await {
        error!("WiFi: Failed to start: {}", Debug2Format(&e));
        return false;
    }

    // Assoziation mit dem AP, begrenzt durch das RESTbudget der Deadline -
    // set_config/start haben bereits davon gezehrt
    match with_timeout(
        Duration::from_millis(attempt.remaining_ms(now_ms())),
        controller.connect_async(),
    )
    .await
    {
        Ok(Ok(())) => info!("WiFi: Associated, waiting for IP address..."),
        Ok(Err(e)) => {
            error!("WiFi: Connection failed: {}", Debug2Format(&e));
            return false;
        }
        Err(_) => {
            warn!("WiFi: Failed to connect (timeout)");
            return false;
        }
    }

    // Auf Link + DHCP-Konfiguration pollen, bis die Deadline abläuft
    loop {
        let link_ready = stack.is_link_up() && stack.config_v4().is_some();
        match attempt.poll(link_ready, now_ms()) {
            ConnectPoll::Connected => {
                if let Some(config) = stack.config_v4() {
                    // Die zugewiesene Adresse wird nur geloggt, nie
                    // zurück in den Config Store geschrieben
                    info!("WiFi: Connected, IP: {}", Debug2Format(&config.address));
                }
                return true;
            }
            ConnectPoll::TimedOut => {
                warn!("WiFi: Failed to connect (timeout)");
                return false;
            }
            ConnectPoll::Pending => {
                Timer::after(Duration::from_millis(WIFI_CONNECT_POLL_MS)).await;
            }
        }
    }
}

/// Schaltet den Controller vom (gescheiterten) Station-Modus in den
/// offenen Provisioning Access Point um
///
/// Einbahnstraße: aus dem AP-Modus führt nur der Neustart nach dem
/// Provisioning-Formular wieder heraus.
pub async fn start_access_point(controller: &mut WifiController<'static>) {
    if matches!(controller.is_started(), Ok(true)) {
        if let Err(e) = controller.stop_async().await {
            error!("WiFi: Failed to stop station mode: {}", Debug2Format(&e));
        }
    }

    // Offenes Netz, feste SSID
    let ap_config =
        ModeConfig::AccessPoint(AccessPointConfig::default().with_ssid(AP_SSID.into()));

    if let Err(e) = controller.set_config(&ap_config) {
        error!("WiFi: Failed to set AP configuration: {}", Debug2Format(&e));
        return;
    }
    match controller.start_async().await {
        Ok(()) => info!("WiFi: Access point '{}' started", AP_SSID),
        Err(e) => error!("WiFi: Failed to start AP: {}", Debug2Format(&e)),
    }
}

/// Network Runner Task für das Station-Interface
#[embassy_executor::task]
pub async fn sta_net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Network Runner Task für das Access-Point-Interface
#[embassy_executor::task]
pub async fn ap_net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP-Server für den Provisioning Access Point
///
/// Clients, die dem offenen AP beitreten, bekommen hier ihre Adresse -
/// ohne den Server wäre das Portal nicht erreichbar.
#[embassy_executor::task]
pub async fn dhcp_server_task(stack: Stack<'static>) {
    use core::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    use edge_dhcp::{
        io::{self, DEFAULT_SERVER_PORT},
        server::{Server, ServerOptions},
    };
    use edge_nal::UdpBind;
    use edge_nal_embassy::{Udp, UdpBuffers};

    let gw_ip_addr = Ipv4Addr::from(crate::config::AP_GATEWAY_IP);

    let mut buf = [0u8; 1500];
    let mut gw_buf = [Ipv4Addr::UNSPECIFIED];

    let buffers = UdpBuffers::<3, 1024, 1024, 10>::new();
    let unbound_socket = Udp::new(stack, &buffers);
    let mut bound_socket = match unbound_socket
        .bind(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            DEFAULT_SERVER_PORT,
        )))
        .await
    {
        Ok(socket) => socket,
        Err(_) => {
            error!("WiFi: Failed to bind DHCP server socket");
            return;
        }
    };

    info!("WiFi: DHCP server listening");

    loop {
        if io::server::run(
            &mut Server::<_, 64>::new_with_et(gw_ip_addr),
            &ServerOptions::new(gw_ip_addr, Some(&mut gw_buf)),
            &mut bound_socket,
            &mut buf,
        )
        .await
        .is_err()
        {
            warn!("WiFi: DHCP server error, restarting");
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}
