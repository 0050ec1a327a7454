// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Heap Allocator (WiFi und HTML-Rendering brauchen dynamischen Speicher)
extern crate alloc;

// Module
pub mod config;
pub mod hal;
pub mod tasks;
pub mod web;

// Re-exports von esp-core
pub use esp_core::{
    ConfigStore, ConnectPoll, ConnectionAttempt, NetworkProfile, ProvisionForm, ResetHold,
    TouchDebounce, TouchSensor, WsCommand,
};

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::pubsub::{PubSubChannel, Subscriber};
use esp_hal::gpio::Output;

use crate::config::{EVENT_MAX_PEERS, EVENT_MAX_PUBLISHERS, EVENT_QUEUE_DEPTH};
use crate::hal::FlashConfigStore;

// ============================================================================
// Type-Aliase für Channel- und Shared-State-Typen
// ============================================================================
//
// Diese Type-Aliase vereinfachen die Lesbarkeit der Funktionssignaturen.
// Statt:  Publisher<'static, NoopRawMutex, EventLine, 4, 8, 2>
// Nutze:  EventPublisher

/// Eine Broadcast-Zeile im Event-Channel (counter:<n>, Log-Zeilen)
pub type EventLine = esp_core::LogLine;

/// PubSubChannel für Event-Broadcasts an alle WebSocket-Peers
/// - Queue-Tiefe, max. Peers und max. Publisher siehe config.rs
/// - Zustellung ist best-effort: volle Queues verdrängen die älteste
///   Nachricht, langsame Peers überspringen Verpasstes kommentarlos
pub type EventChannel =
    PubSubChannel<NoopRawMutex, EventLine, EVENT_QUEUE_DEPTH, EVENT_MAX_PEERS, EVENT_MAX_PUBLISHERS>;

/// Subscriber für Event-Broadcasts (eine WebSocket-Verbindung = ein Slot)
pub type EventSubscriber = Subscriber<
    'static,
    NoopRawMutex,
    EventLine,
    EVENT_QUEUE_DEPTH,
    EVENT_MAX_PEERS,
    EVENT_MAX_PUBLISHERS,
>;

/// Signal vom Portal-Handler an den Reboot-Task
pub type RebootSignal = embassy_sync::signal::Signal<CriticalSectionRawMutex, ()>;

/// Flash Config Store, geteilt zwischen HTTP-Handlern und Monitor-Task
///
/// Die Tasks laufen kooperativ auf einem Executor; die Mutex macht die
/// Zugriffe trotzdem explizit exklusiv statt auf Scheduling-Details zu bauen.
pub type SharedStore = Mutex<CriticalSectionRawMutex, RefCell<FlashConfigStore<'static>>>;

/// Geräte-Ausgang (LED), geteilt zwischen den HTTP-Handlern
pub type SharedOutput = Mutex<CriticalSectionRawMutex, RefCell<Output<'static>>>;

// ============================================================================
// Helper
// ============================================================================

/// Loggt eine Zeile: anhängen an /log.txt UND Broadcast an alle Peers
///
/// Die Logdatei wird pro Aufruf geöffnet und geschlossen (kein gehaltenes
/// Handle). Der Broadcast geht an ALLE verbundenen Peers, nicht nur an den
/// Auslöser - jeder sieht alles.
pub fn log_event(store: &SharedStore, events: &EventChannel, line: &str) {
    store.lock(|store| {
        store
            .borrow_mut()
            .append_line(esp_core::LOG_PATH, line);
    });

    events.publish_immediate(make_event(line));
}

/// Baut eine Broadcast-Zeile, bei Bedarf an einer Zeichengrenze gekürzt
pub fn make_event(line: &str) -> EventLine {
    let mut event = EventLine::new();
    let mut end = core::cmp::min(line.len(), event.capacity());
    while end > 0 && !line.is_char_boundary(end) {
        end -= 1;
    }
    let _ = event.push_str(&line[..end]);
    event
}

/// Aktueller Zustand des Geräte-Ausgangs als Template-Wert
pub fn output_state_label(output: &SharedOutput) -> &'static str {
    let is_on = output.lock(|output| output.borrow().is_set_high());
    if is_on { "ON" } else { "OFF" }
}
