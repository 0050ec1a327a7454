//! Integration Tests für die Wi-Fi-Manager Logic
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockConfigStore

use std::collections::BTreeMap;

use esp_core::{
    ConfigStore, ConfigValue, ConnectPoll, ConnectionAttempt, NetworkProfile, ProvisionForm,
    ResetHold, TouchDebounce, GATEWAY_PATH, IP_PATH, LOG_PATH, PASS_PATH, SSID_PATH,
};

// ============================================================================
// Mock Config Store
// ============================================================================

/// Pfad → Inhalt, wie ein kleines Dateisystem
#[derive(Default)]
pub struct MockConfigStore {
    pub files: BTreeMap<String, String>,
}

impl MockConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(ssid: &str, pass: &str, ip: &str, gateway: &str) -> Self {
        let mut store = Self::new();
        store.write(SSID_PATH, ssid);
        store.write(PASS_PATH, pass);
        store.write(IP_PATH, ip);
        store.write(GATEWAY_PATH, gateway);
        store
    }
}

impl ConfigStore for MockConfigStore {
    fn read(&mut self, path: &str) -> ConfigValue {
        let mut value = ConfigValue::new();
        if let Some(content) = self.files.get(path) {
            let _ = value.push_str(esp_core::first_line(content));
        }
        value
    }

    fn write(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    fn append_line(&mut self, path: &str, line: &str) {
        let entry = self.files.entry(path.to_string()).or_default();
        entry.push_str(line);
        entry.push('\n');
    }

    fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    fn erase_all(&mut self) {
        self.files.clear();
    }
}

// ============================================================================
// Tests: MockConfigStore
// ============================================================================

#[test]
fn test_mock_store_read_missing_is_empty() {
    let mut store = MockConfigStore::new();
    assert_eq!(store.read(SSID_PATH).as_str(), "");
}

#[test]
fn test_mock_store_write_then_read() {
    let mut store = MockConfigStore::new();
    store.write(SSID_PATH, "MeinNetz");
    assert_eq!(store.read(SSID_PATH).as_str(), "MeinNetz");
}

#[test]
fn test_mock_store_read_returns_first_line() {
    let mut store = MockConfigStore::new();
    store.write(IP_PATH, "192.168.1.200\nGeraffel");
    assert_eq!(store.read(IP_PATH).as_str(), "192.168.1.200");
}

#[test]
fn test_mock_store_remove_missing_is_false() {
    let mut store = MockConfigStore::new();
    assert!(!store.remove(SSID_PATH));
}

// ============================================================================
// Tests: Netzwerk-Profil laden und schreiben
// ============================================================================

#[test]
fn test_load_profile_from_populated_store() {
    let mut store = MockConfigStore::with_profile("MeinNetz", "geheim", "192.168.1.200", "192.168.1.1");
    let profile = esp_core::load_profile(&mut store);
    assert_eq!(profile.ssid.as_str(), "MeinNetz");
    assert_eq!(profile.pass.as_str(), "geheim");
    assert_eq!(profile.ip.as_str(), "192.168.1.200");
    assert_eq!(profile.gateway.as_str(), "192.168.1.1");
    assert!(profile.is_usable());
}

#[test]
fn test_load_profile_from_empty_store() {
    let mut store = MockConfigStore::new();
    let profile = esp_core::load_profile(&mut store);
    assert_eq!(profile.ssid.as_str(), "");
    assert!(!profile.is_usable());
}

#[test]
fn test_profile_without_ip_is_not_usable() {
    let mut store = MockConfigStore::new();
    store.write(SSID_PATH, "MeinNetz");
    store.write(PASS_PATH, "geheim");
    let profile = esp_core::load_profile(&mut store);
    assert!(!profile.is_usable());
}

#[test]
fn test_apply_submission_full_form() {
    let mut store = MockConfigStore::new();
    let form = ProvisionForm {
        ssid: Some(ConfigValue::try_from("MeinNetz").unwrap()),
        pass: Some(ConfigValue::try_from("geheim").unwrap()),
        ip: Some(ConfigValue::try_from("192.168.1.200").unwrap()),
        gateway: Some(ConfigValue::try_from("192.168.1.1").unwrap()),
    };

    esp_core::apply_submission(&mut store, &form);

    assert_eq!(store.read(SSID_PATH).as_str(), "MeinNetz");
    assert_eq!(store.read(PASS_PATH).as_str(), "geheim");
    assert_eq!(store.read(IP_PATH).as_str(), "192.168.1.200");
    assert_eq!(store.read(GATEWAY_PATH).as_str(), "192.168.1.1");
}

#[test]
fn test_apply_submission_partial_form_keeps_other_slots() {
    let mut store = MockConfigStore::with_profile("AltesNetz", "alt", "192.168.1.200", "192.168.1.1");
    let form = ProvisionForm {
        ssid: Some(ConfigValue::try_from("NeuesNetz").unwrap()),
        pass: None,
        ip: None,
        gateway: None,
    };

    esp_core::apply_submission(&mut store, &form);

    // Nur die SSID wurde ersetzt, der Rest bleibt stehen
    assert_eq!(store.read(SSID_PATH).as_str(), "NeuesNetz");
    assert_eq!(store.read(PASS_PATH).as_str(), "alt");
    assert_eq!(store.read(IP_PATH).as_str(), "192.168.1.200");
    assert_eq!(store.read(GATEWAY_PATH).as_str(), "192.168.1.1");
}

#[test]
fn test_apply_submission_empty_form_writes_nothing() {
    let mut store = MockConfigStore::new();
    esp_core::apply_submission(&mut store, &ProvisionForm::default());
    assert!(store.files.is_empty());
}

// ============================================================================
// Tests: Lösch-Operationen
// ============================================================================

#[test]
fn test_clear_configuration_all_present() {
    let mut store = MockConfigStore::with_profile("MeinNetz", "geheim", "192.168.1.200", "192.168.1.1");
    assert!(esp_core::clear_configuration(&mut store));
    assert!(store.files.is_empty());
}

#[test]
fn test_clear_configuration_partial_deletes_everything_but_reports_failure() {
    let mut store = MockConfigStore::new();
    store.write(SSID_PATH, "MeinNetz");
    store.write(PASS_PATH, "geheim");
    store.write(GATEWAY_PATH, "192.168.1.1");
    // IP-Slot fehlt

    let result = esp_core::clear_configuration(&mut store);

    // Misserfolg gemeldet, aber alle vorhandenen Slots sind trotzdem weg
    assert!(!result);
    assert!(store.files.is_empty());
}

#[test]
fn test_clear_log() {
    let mut store = MockConfigStore::new();
    store.append_line(LOG_PATH, "counter:1");
    assert!(esp_core::clear_log(&mut store));
    assert!(!store.files.contains_key(LOG_PATH));
}

#[test]
fn test_clear_log_missing_reports_failure() {
    let mut store = MockConfigStore::new();
    assert!(!esp_core::clear_log(&mut store));
}

// ============================================================================
// Tests: WebSocket-Kommando-Dispatch
// ============================================================================

#[test]
fn test_dispatch_clear_measurements_success() {
    let mut store = MockConfigStore::new();
    store.append_line(LOG_PATH, "counter:1");

    let reply = esp_core::dispatch_command(&mut store, "clear_measurements");
    assert_eq!(reply, Some("Messwerte gelöscht."));
    assert!(!store.files.contains_key(LOG_PATH));
}

#[test]
fn test_dispatch_clear_measurements_without_log() {
    let mut store = MockConfigStore::new();
    let reply = esp_core::dispatch_command(&mut store, "clear_measurements");
    assert_eq!(reply, Some("Messwerte konnten nicht gelöscht werden."));
}

#[test]
fn test_dispatch_clear_configuration_success() {
    let mut store = MockConfigStore::with_profile("MeinNetz", "geheim", "192.168.1.200", "192.168.1.1");
    let reply = esp_core::dispatch_command(&mut store, "clear_configuration");
    assert_eq!(reply, Some("Konfiguration gelöscht."));
}

#[test]
fn test_dispatch_clear_configuration_partial_reports_failure() {
    let mut store = MockConfigStore::new();
    store.write(SSID_PATH, "MeinNetz");
    let reply = esp_core::dispatch_command(&mut store, "clear_configuration");
    assert_eq!(reply, Some("Konfiguration konnte nicht gelöscht werden."));
    assert!(store.files.is_empty());
}

#[test]
fn test_dispatch_unknown_command_is_ignored() {
    let mut store = MockConfigStore::new();
    store.write(SSID_PATH, "MeinNetz");

    assert_eq!(esp_core::dispatch_command(&mut store, "reboot"), None);
    assert_eq!(esp_core::dispatch_command(&mut store, ""), None);
    // Kein Präfix-Match: ein Zusatz am Kommando zählt nicht
    assert_eq!(
        esp_core::dispatch_command(&mut store, "clear_measurements "),
        None
    );
    // Nichts wurde angefasst
    assert_eq!(store.read(SSID_PATH).as_str(), "MeinNetz");
}

// ============================================================================
// Tests: Touch-Debounce
// ============================================================================

#[test]
fn test_touch_burst_within_window_counts_once() {
    let mut touch = TouchDebounce::new(40, 500);

    // Prellender Kontakt: viele Samples unter der Schwelle in kurzer Folge
    assert_eq!(touch.sample(10, 1000), Some(1));
    assert_eq!(touch.sample(12, 1020), None);
    assert_eq!(touch.sample(8, 1100), None);
    assert_eq!(touch.sample(15, 1499), None);
    assert_eq!(touch.counter(), 1);
}

#[test]
fn test_touch_after_window_counts_again() {
    let mut touch = TouchDebounce::new(40, 500);
    assert_eq!(touch.sample(10, 1000), Some(1));
    // Genau am Fensterrand noch nicht, danach wieder
    assert_eq!(touch.sample(10, 1500), None);
    assert_eq!(touch.sample(10, 1501), Some(2));
}

#[test]
fn test_touch_rejected_sample_does_not_move_window() {
    let mut touch = TouchDebounce::new(40, 500);
    assert_eq!(touch.sample(10, 1000), Some(1));
    // Sample über der Schwelle mitten im Fenster
    assert_eq!(touch.sample(100, 1400), None);
    // Das Fenster misst weiter ab der letzten AKZEPTIERTEN Berührung
    assert_eq!(touch.sample(10, 1501), Some(2));
}

#[test]
fn test_touch_counter_survives_idle_phases() {
    let mut touch = TouchDebounce::new(40, 500);
    assert_eq!(touch.sample(10, 1000), Some(1));
    assert_eq!(touch.sample(10, 10_000), Some(2));
    assert_eq!(touch.sample(10, 99_000), Some(3));
    assert_eq!(touch.counter(), 3);
}

#[test]
fn test_touch_debounce_survives_clock_wraparound() {
    let mut touch = TouchDebounce::new(40, 500);
    assert_eq!(touch.sample(10, u64::MAX - 100), Some(1));
    // Uhr läuft über; 501 ms später liegt das Sample hinter dem Fenster
    assert_eq!(touch.sample(10, 500u64.wrapping_sub(100)), Some(2));
}

// ============================================================================
// Tests: Reset-Langdruck
// ============================================================================

#[test]
fn test_reset_hold_fires_exactly_once_per_hold() {
    let mut hold = ResetHold::new(10_000);

    assert!(!hold.sample(true, 0));
    assert!(!hold.sample(true, 5_000));
    assert!(hold.sample(true, 10_001));
    // Weiter gehalten: kein zweites Feuern
    assert!(!hold.sample(true, 15_000));
    assert!(!hold.sample(true, 60_000));
}

#[test]
fn test_reset_short_presses_do_not_accumulate() {
    let mut hold = ResetHold::new(10_000);

    // Zwei Drücke zu je 6 Sekunden, zusammen über der Haltedauer
    assert!(!hold.sample(true, 0));
    assert!(!hold.sample(true, 6_000));
    assert!(!hold.sample(false, 6_100));
    assert!(!hold.sample(true, 7_000));
    assert!(!hold.sample(true, 13_000));
    // Erst 10 s nach dem ZWEITEN Druckbeginn feuert es
    assert!(hold.sample(true, 17_001));
}

#[test]
fn test_reset_hold_rearms_after_release() {
    let mut hold = ResetHold::new(10_000);

    assert!(!hold.sample(true, 0));
    assert!(hold.sample(true, 10_001));
    assert!(!hold.sample(false, 11_000));
    // Neuer Haltevorgang feuert erneut
    assert!(!hold.sample(true, 20_000));
    assert!(hold.sample(true, 30_001));
}

// ============================================================================
// Tests: Verbindungs-Bootstrap
// ============================================================================

fn usable_profile() -> NetworkProfile {
    NetworkProfile {
        ssid: ConfigValue::try_from("MeinNetz").unwrap(),
        pass: ConfigValue::try_from("geheim").unwrap(),
        ip: ConfigValue::try_from("192.168.1.200").unwrap(),
        gateway: ConfigValue::try_from("192.168.1.1").unwrap(),
    }
}

#[test]
fn test_connection_attempt_rejects_missing_ssid() {
    let mut profile = usable_profile();
    profile.ssid = ConfigValue::new();
    assert!(ConnectionAttempt::begin(&profile, 0, 10_000).is_none());
}

#[test]
fn test_connection_attempt_rejects_missing_ip() {
    let mut profile = usable_profile();
    profile.ip = ConfigValue::new();
    assert!(ConnectionAttempt::begin(&profile, 0, 10_000).is_none());
}

#[test]
fn test_connection_attempt_allows_empty_password() {
    // Offene Netze haben kein Passwort, das Profil ist trotzdem brauchbar
    let mut profile = usable_profile();
    profile.pass = ConfigValue::new();
    assert!(ConnectionAttempt::begin(&profile, 0, 10_000).is_some());
}

#[test]
fn test_connection_attempt_pending_then_timeout() {
    let attempt = ConnectionAttempt::begin(&usable_profile(), 1_000, 10_000).unwrap();

    assert_eq!(attempt.poll(false, 1_000), ConnectPoll::Pending);
    assert_eq!(attempt.poll(false, 10_999), ConnectPoll::Pending);
    assert_eq!(attempt.poll(false, 11_000), ConnectPoll::TimedOut);
}

#[test]
fn test_connection_attempt_connected_wins_at_deadline() {
    let attempt = ConnectionAttempt::begin(&usable_profile(), 0, 10_000).unwrap();
    // Link steht im selben Tick, in dem die Deadline abläuft
    assert_eq!(attempt.poll(true, 10_000), ConnectPoll::Connected);
}

#[test]
fn test_connection_attempt_remaining_budget_shrinks() {
    let attempt = ConnectionAttempt::begin(&usable_profile(), 1_000, 10_000).unwrap();

    // Teilschritte des Verbindungsaufbaus zehren alle vom selben Budget:
    // die Restzeit schrumpft mit der Uhr und wird nie negativ
    assert_eq!(attempt.remaining_ms(1_000), 10_000);
    assert_eq!(attempt.remaining_ms(4_000), 7_000);
    assert_eq!(attempt.remaining_ms(11_000), 0);
    assert_eq!(attempt.remaining_ms(25_000), 0);
}

#[test]
fn test_connection_attempt_success_before_deadline() {
    let attempt = ConnectionAttempt::begin(&usable_profile(), 0, 10_000).unwrap();
    assert_eq!(attempt.poll(false, 3_000), ConnectPoll::Pending);
    assert_eq!(attempt.poll(true, 4_000), ConnectPoll::Connected);
}
