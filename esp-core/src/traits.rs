//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use crate::types::ConfigValue;

// ============================================================================
// Pfade im Config Store
// ============================================================================

/// Slot für den WiFi-Netzwerknamen
pub const SSID_PATH: &str = "/ssid.txt";
/// Slot für das WiFi-Passwort
pub const PASS_PATH: &str = "/pass.txt";
/// Slot für die statische IP-Adresse
pub const IP_PATH: &str = "/ip.txt";
/// Slot für die Gateway-Adresse
pub const GATEWAY_PATH: &str = "/gateway.txt";
/// Append-only Logdatei
pub const LOG_PATH: &str = "/log.txt";

/// Trait für den persistenten Config Store (Pfad → String)
///
/// Alle Operationen sind best-effort: Lesefehler und fehlende Dateien sind
/// für den Aufrufer nicht unterscheidbar (beides liefert einen leeren
/// String), Schreibfehler werden nur geloggt. Kein Aufrufer bekommt
/// strukturierte Fehler über die Komponentengrenze.
///
/// # Implementierungen
/// - **Production:** FlashConfigStore (esp-storage, ein Sektor pro Slot)
/// - **Testing:** MockConfigStore (in-memory, in esp-tests)
pub trait ConfigStore {
    /// Liest einen Wert. Nur die erste Zeile zählt - Inhalt ab dem ersten
    /// Zeilenumbruch wird verworfen. Leerer String bei Fehler oder Miss.
    fn read(&mut self, path: &str) -> ConfigValue;

    /// Überschreibt einen Wert komplett. Best-effort, kein Rückgabewert.
    fn write(&mut self, path: &str, content: &str);

    /// Hängt eine Zeile an eine Logdatei an. Best-effort. Die Datei wird
    /// pro Aufruf geöffnet und geschlossen, kein Handle bleibt offen.
    fn append_line(&mut self, path: &str, line: &str);

    /// Löscht eine Datei. `false` wenn die Datei nicht existierte oder das
    /// Löschen fehlschlug (nicht unterscheidbar, wie bei SPIFFS.remove).
    fn remove(&mut self, path: &str) -> bool;

    /// Factory-Reset: löscht das komplette persistierte Dateisystem.
    fn erase_all(&mut self);
}

/// Trait für den kapazitiven Touch-Eingang
///
/// Liefert den Roh-Messwert; kleinere Werte bedeuten Berührung
/// (sensor-spezifische Polarität).
///
/// # Implementierungen
/// - **Production:** AdcTouchSensor (ADC1 Oneshot)
/// - **Testing:** feste Sample-Folgen direkt gegen TouchDebounce
pub trait TouchSensor {
    /// Liest den aktuellen Roh-Messwert
    fn read_raw(&mut self) -> u16;
}
