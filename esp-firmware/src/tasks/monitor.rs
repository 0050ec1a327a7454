// Input Monitor Task - Touch-Sensor und Factory-Reset-Taster
use defmt::{info, warn};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::gpio::Input;

use esp_core::{ResetHold, TouchDebounce, TouchSensor, format_counter};

use crate::config::*;
use crate::hal::AdcTouchSensor;
use crate::{EventChannel, SharedStore, make_event};

/// Input Monitor Task - pollt beide Eingänge im festen Takt
///
/// Läuft in JEDEM Modus, auch im Provisioning-Portal: der Factory-Reset
/// muss ein Gerät mit kaputter Konfiguration genauso retten können.
///
/// - Touch: entprellte Berührungen zählen und `counter:<n>` an alle
///   WebSocket-Peers broadcasten
/// - Reset-Taster (active-low): nach ununterbrochenem Halten über die
///   Haltedauer wird der komplette Config Store gelöscht und neu gestartet
#[embassy_executor::task]
pub async fn input_monitor_task(
    mut touch: AdcTouchSensor,
    reset_pin: Input<'static>,
    store: &'static SharedStore,
    events: &'static EventChannel,
) {
    info!("Monitor: Input monitor started");

    let mut debounce = TouchDebounce::new(TOUCH_THRESHOLD, TOUCH_DEBOUNCE_MS);
    let mut reset_hold = ResetHold::new(RESET_HOLD_MS);

    loop {
        let now = Instant::now().as_millis();

        // Entprellte Berührung: nur akzeptierte Samples zählen.
        // Der Zählerstand wird NUR gebroadcastet, nie persistiert -
        // die Logdatei ist den Schalt-Aktionen vorbehalten.
        let raw = touch.read_raw();
        if let Some(count) = debounce.sample(raw, now) {
            let frame = format_counter(count);
            info!("Monitor: Touch accepted, {}", frame.as_str());
            events.publish_immediate(make_event(frame.as_str()));
        }

        // Factory Reset: Taster gegen GND, gedrückt = low
        if reset_hold.sample(reset_pin.is_low(), now) {
            warn!("Monitor: Reset hold expired, erasing configuration");
            store.lock(|store| store.borrow_mut().erase_all());
            esp_hal::system::software_reset();
        }

        Timer::after(Duration::from_millis(MONITOR_TICK_MS)).await;
    }
}
