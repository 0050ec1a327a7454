// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use core::cell::RefCell;
use core::net::Ipv4Addr;

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Ipv4Cidr, StackResources, StaticConfigV4};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use defmt::info;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use esp_wifi_manager::config::{
    AP_GATEWAY_IP, AP_PREFIX_LEN, EXTRA_HEAP_SIZE, HTTP_TASK_POOL, PORTAL_TASK_POOL,
    WIFI_HEAP_SIZE,
};
use esp_wifi_manager::hal::{AdcTouchSensor, FlashConfigStore};
use esp_wifi_manager::tasks::{
    ap_net_task, connect_station, dhcp_server_task, http_server_task, input_monitor_task,
    portal_server_task, reboot_task, sta_net_task, start_access_point,
};
use esp_wifi_manager::{EventChannel, RebootSignal, SharedOutput, SharedStore};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware und Netzwerk-Stacks, lädt das gespeicherte
/// Netzwerk-Profil und entscheidet dann einmalig pro Boot:
/// - Profil brauchbar und Verbindung steht → Betriebsmodus (Steuer-UI)
/// - sonst → Provisioning-Portal im Access-Point-Modus
///
/// Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Config Store auf dem Flash öffnen und Netzwerk-Profil laden
    let mut flash_store = FlashConfigStore::new(peripherals.FLASH);
    let profile = esp_core::load_profile(&mut flash_store);
    info!("Boot: Stored SSID: '{}'", profile.ssid.as_str());

    static STORE: static_cell::StaticCell<SharedStore> = static_cell::StaticCell::new();
    let store = &*STORE.init(Mutex::new(RefCell::new(flash_store)));

    // Geräte-Ausgang (LED), startet AUS
    let led = Output::new(
        peripherals.GPIO8,
        Level::Low,
        OutputConfig::default(),
    );
    static OUTPUT: static_cell::StaticCell<SharedOutput> = static_cell::StaticCell::new();
    let output = &*OUTPUT.init(Mutex::new(RefCell::new(led)));

    // Reset-Taster gegen GND (gedrückt = low)
    let reset_pin = Input::new(
        peripherals.GPIO4,
        InputConfig::default().with_pull(Pull::Up),
    );

    // Touch-Sensor am ADC
    let touch = AdcTouchSensor::new(peripherals.ADC1, peripherals.GPIO2);

    // Event-Channel für Broadcasts an alle WebSocket-Peers
    static EVENTS: static_cell::StaticCell<EventChannel> = static_cell::StaticCell::new();
    let events = &*EVENTS.init(EventChannel::new());

    // Input Monitor läuft in JEDEM Modus - der Factory-Reset muss auch
    // ein falsch konfiguriertes Gerät retten können
    spawner
        .spawn(input_monitor_task(touch, reset_pin, store, events))
        .unwrap();

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (mut wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stacks (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Beide Interfaces bekommen ihren eigenen Stack; aktiv ist pro Boot
    // nur einer, je nach Modus-Entscheidung unten
    static STA_RESOURCES: static_cell::StaticCell<StackResources<8>> =
        static_cell::StaticCell::new();
    let (sta_stack, sta_runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        STA_RESOURCES.init(StackResources::new()),
        seed,
    );

    let gw_ip_addr = Ipv4Addr::from(AP_GATEWAY_IP);
    let ap_net_config = NetConfig::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(gw_ip_addr, AP_PREFIX_LEN),
        gateway: Some(gw_ip_addr),
        dns_servers: Default::default(),
    });
    static AP_RESOURCES: static_cell::StaticCell<StackResources<6>> =
        static_cell::StaticCell::new();
    let (ap_stack, ap_runner) = embassy_net::new(
        wifi_interface.ap,
        ap_net_config,
        AP_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(sta_net_task(sta_runner)).unwrap();
    spawner.spawn(ap_net_task(ap_runner)).unwrap();

    // Einmaliger Verbindungsversuch mit Deadline, danach steht der Modus
    // für diesen Boot fest
    if connect_station(&mut wifi_controller, sta_stack, &profile).await {
        info!("Boot: Entering operating mode");

        // HTTP Server Tasks (4x für concurrent connections)
        for task_id in 0..HTTP_TASK_POOL {
            spawner
                .spawn(http_server_task(task_id, sta_stack, store, output, events))
                .unwrap();
        }
    } else {
        info!("Boot: Entering provisioning mode");

        start_access_point(&mut wifi_controller).await;

        static REBOOT: static_cell::StaticCell<RebootSignal> = static_cell::StaticCell::new();
        let reboot = &*REBOOT.init(RebootSignal::new());

        spawner.spawn(dhcp_server_task(ap_stack)).unwrap();
        spawner.spawn(reboot_task(reboot)).unwrap();

        for task_id in 0..PORTAL_TASK_POOL {
            spawner
                .spawn(portal_server_task(task_id, ap_stack, store, reboot))
                .unwrap();
        }
    }

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
