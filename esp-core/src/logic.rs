//! Pure Business Logic Functions
//!
//! Zustands- und Timing-Logik ohne Hardware-Dependencies (testbar!).
//! Alle Zeitvergleiche nutzen `wrapping_sub` auf Millisekunden-Ticks,
//! damit ein Überlauf des monotonen Zählers keine Fehltrigger erzeugt.

use crate::traits::{ConfigStore, GATEWAY_PATH, IP_PATH, LOG_PATH, PASS_PATH, SSID_PATH};
use crate::types::{NetworkProfile, ProvisionForm, WsCommand};

// ============================================================================
// Debounce & Reset-Timer
// ============================================================================

/// Entprellter Touch-Zähler
///
/// Ein Sample gilt als Berührung, wenn der Rohwert UNTER der Schwelle liegt
/// und seit der letzten akzeptierten Berührung mehr als das Debounce-Fenster
/// vergangen ist. Nur akzeptierte Berührungen bewegen das Fenster - ein
/// Sample über der Schwelle setzt den Timer nicht zurück.
///
/// Der Zähler lebt nur für die Prozess-Lebensdauer und startet bei 0.
pub struct TouchDebounce {
    threshold: u16,
    window_ms: u64,
    last_touch_ms: u64,
    counter: u32,
}

impl TouchDebounce {
    pub fn new(threshold: u16, window_ms: u64) -> Self {
        Self {
            threshold,
            window_ms,
            last_touch_ms: 0,
            counter: 0,
        }
    }

    /// Verarbeitet ein Sample. Gibt bei einer akzeptierten Berührung den
    /// neuen Zählerstand zurück, sonst `None`.
    pub fn sample(&mut self, raw: u16, now_ms: u64) -> Option<u32> {
        if raw < self.threshold && now_ms.wrapping_sub(self.last_touch_ms) > self.window_ms {
            self.counter += 1;
            self.last_touch_ms = now_ms;
            Some(self.counter)
        } else {
            None
        }
    }

    /// Aktueller Zählerstand
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

/// Langdruck-Timer für den Reset-Knopf
///
/// Der Startzeitpunkt wird beim Übergang losgelassen → gedrückt gesetzt und
/// bei JEDEM losgelassenen Sample gelöscht - mehrere kurze Drücke sammeln
/// keine Haltezeit an. Die Aktion feuert höchstens einmal pro Haltevorgang.
pub struct ResetHold {
    hold_ms: u64,
    press_start_ms: Option<u64>,
    fired: bool,
}

impl ResetHold {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            press_start_ms: None,
            fired: false,
        }
    }

    /// Verarbeitet ein Sample (`pressed` = Knopf aktiv). Gibt genau einmal
    /// `true` zurück, wenn die Haltezeit überschritten wurde.
    pub fn sample(&mut self, pressed: bool, now_ms: u64) -> bool {
        if !pressed {
            self.press_start_ms = None;
            self.fired = false;
            return false;
        }

        let start = *self.press_start_ms.get_or_insert(now_ms);
        if !self.fired && now_ms.wrapping_sub(start) > self.hold_ms {
            self.fired = true;
            return true;
        }
        false
    }
}

// ============================================================================
// Verbindungs-Bootstrap
// ============================================================================

/// Ergebnis eines Poll-Schritts während des Verbindungsaufbaus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectPoll {
    /// Link steht - Aufrufer kann in den Betriebsmodus wechseln
    Connected,
    /// Deadline noch nicht erreicht, weiter pollen
    Pending,
    /// Timeout abgelaufen - Aufrufer fällt ins Provisioning zurück
    TimedOut,
}

/// Zustand eines einzelnen, zeitlich begrenzten Verbindungsversuchs
///
/// Reine Funktion von (Profil, Uhr) → Ergebnis: der Transport pollt den
/// Link-Status und füttert ihn hier ein. Kein Retry - was nach dem Timeout
/// passiert, entscheidet der Aufrufer.
#[derive(Clone, Copy)]
pub struct ConnectionAttempt {
    started_ms: u64,
    timeout_ms: u64,
}

impl ConnectionAttempt {
    /// Startet einen Versuch. `None` wenn das Profil unbrauchbar ist
    /// (SSID oder IP leer) - dann wird gar nicht erst verbunden.
    pub fn begin(profile: &NetworkProfile, now_ms: u64, timeout_ms: u64) -> Option<Self> {
        if !profile.is_usable() {
            return None;
        }
        Some(Self {
            started_ms: now_ms,
            timeout_ms,
        })
    }

    /// Restzeit bis zur Deadline, 0 wenn sie bereits abgelaufen ist
    ///
    /// Die Deadline gilt für den GESAMTEN Versuch - Teilschritte des
    /// Transports (Start, Assoziation) zehren vom selben Budget.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.timeout_ms
            .saturating_sub(now_ms.wrapping_sub(self.started_ms))
    }

    /// Ein Poll-Schritt. `Connected` gewinnt gegen den Timeout, wenn der
    /// Link im selben Tick steht.
    pub fn poll(&self, link_ready: bool, now_ms: u64) -> ConnectPoll {
        if link_ready {
            ConnectPoll::Connected
        } else if now_ms.wrapping_sub(self.started_ms) >= self.timeout_ms {
            ConnectPoll::TimedOut
        } else {
            ConnectPoll::Pending
        }
    }
}

// ============================================================================
// Config-Store-Operationen
// ============================================================================

/// Liefert den Inhalt bis zum ersten Zeilenumbruch
///
/// Werte werden einzeilig gespeichert; alles ab `\n` wird beim Lesen
/// verworfen.
pub fn first_line(content: &str) -> &str {
    match content.find('\n') {
        Some(idx) => &content[..idx],
        None => content,
    }
}

/// Lädt das Netzwerk-Profil aus den vier Slots
pub fn load_profile<S: ConfigStore>(store: &mut S) -> NetworkProfile {
    NetworkProfile {
        ssid: store.read(SSID_PATH),
        pass: store.read(PASS_PATH),
        ip: store.read(IP_PATH),
        gateway: store.read(GATEWAY_PATH),
    }
}

/// Schreibt die im Formular vorhandenen Felder in ihre Slots
///
/// Fehlende Felder lassen den gespeicherten Wert unverändert. Auch ein
/// leeres Formular ist gültig - dann wird nichts geschrieben.
pub fn apply_submission<S: ConfigStore>(store: &mut S, form: &ProvisionForm) {
    if let Some(ssid) = &form.ssid {
        store.write(SSID_PATH, ssid);
    }
    if let Some(pass) = &form.pass {
        store.write(PASS_PATH, pass);
    }
    if let Some(ip) = &form.ip {
        store.write(IP_PATH, ip);
    }
    if let Some(gateway) = &form.gateway {
        store.write(GATEWAY_PATH, gateway);
    }
}

/// Löscht die Logdatei
pub fn clear_log<S: ConfigStore>(store: &mut S) -> bool {
    store.remove(LOG_PATH)
}

/// Löscht alle vier Konfigurations-Slots
///
/// Meldet Erfolg nur, wenn ALLE vier remove-Aufrufe `true` liefern.
/// Fehlt ein Slot bereits, wird Misserfolg gemeldet, obwohl der Endzustand
/// stimmt - Verhalten der Vorgänger-Firmware, bewusst beibehalten.
/// Alle vier Aufrufe laufen immer; es gibt kein Short-Circuit.
pub fn clear_configuration<S: ConfigStore>(store: &mut S) -> bool {
    let ssid = store.remove(SSID_PATH);
    let pass = store.remove(PASS_PATH);
    let ip = store.remove(IP_PATH);
    let gateway = store.remove(GATEWAY_PATH);
    ssid && pass && ip && gateway
}

// ============================================================================
// WebSocket-Kommando-Dispatch
// ============================================================================

/// Bestätigungstexte für die Lösch-Kommandos (gehen nur an den Absender)
pub const MSG_MEASUREMENTS_CLEARED: &str = "Messwerte gelöscht.";
pub const MSG_MEASUREMENTS_FAILED: &str = "Messwerte konnten nicht gelöscht werden.";
pub const MSG_CONFIG_CLEARED: &str = "Konfiguration gelöscht.";
pub const MSG_CONFIG_FAILED: &str = "Konfiguration konnte nicht gelöscht werden.";

/// Dispatch-Tabelle für eingehende WebSocket-Texte
///
/// Bekannte Kommandos führen ihre Aktion aus und liefern den
/// Bestätigungstext für den Absender. Unbekannte Texte werden ignoriert
/// (`None`, keine Antwort).
pub fn dispatch_command<S: ConfigStore>(store: &mut S, text: &str) -> Option<&'static str> {
    match WsCommand::try_from(text).ok()? {
        WsCommand::ClearMeasurements => Some(if clear_log(store) {
            MSG_MEASUREMENTS_CLEARED
        } else {
            MSG_MEASUREMENTS_FAILED
        }),
        WsCommand::ClearConfiguration => Some(if clear_configuration(store) {
            MSG_CONFIG_CLEARED
        } else {
            MSG_CONFIG_FAILED
        }),
    }
}

// ============================================================================
// Formatierung & Templates
// ============================================================================

/// Platzhalter in index.html, wird beim Rendern durch den Ausgangs-Zustand
/// ersetzt
pub const STATE_PLACEHOLDER: &str = "%STATE%";

/// Formatiert das Zähler-Broadcast-Frame `counter:<n>`
pub fn format_counter(counter: u32) -> heapless::String<24> {
    let mut line = heapless::String::new();
    // u32 passt immer in 24 Zeichen
    let _ = core::fmt::Write::write_fmt(&mut line, format_args!("counter:{counter}"));
    line
}

/// Ersetzt jedes Vorkommen von `%STATE%` im Template durch `state`
///
/// Wird pro Request frisch gerendert, nichts wird gecacht.
pub fn render_state_template<W: core::fmt::Write>(
    out: &mut W,
    template: &str,
    state: &str,
) -> core::fmt::Result {
    let mut rest = template;
    while let Some(idx) = rest.find(STATE_PLACEHOLDER) {
        out.write_str(&rest[..idx])?;
        out.write_str(state)?;
        rest = &rest[idx + STATE_PLACEHOLDER.len()..];
    }
    out.write_str(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_without_newline() {
        assert_eq!(first_line("MeinNetz"), "MeinNetz");
    }

    #[test]
    fn test_first_line_cuts_at_newline() {
        assert_eq!(first_line("MeinNetz\nRest\nMehr"), "MeinNetz");
    }

    #[test]
    fn test_format_counter() {
        assert_eq!(format_counter(0).as_str(), "counter:0");
        assert_eq!(format_counter(42).as_str(), "counter:42");
        assert_eq!(format_counter(u32::MAX).as_str(), "counter:4294967295");
    }

    #[test]
    fn test_render_state_template() {
        let mut out = heapless::String::<64>::new();
        render_state_template(&mut out, "LED ist %STATE%!", "ON").unwrap();
        assert_eq!(out.as_str(), "LED ist ON!");
    }

    #[test]
    fn test_render_state_template_multiple_occurrences() {
        let mut out = heapless::String::<64>::new();
        render_state_template(&mut out, "%STATE%-%STATE%", "OFF").unwrap();
        assert_eq!(out.as_str(), "OFF-OFF");
    }

    #[test]
    fn test_touch_debounce_accepts_below_threshold() {
        let mut touch = TouchDebounce::new(40, 500);
        assert_eq!(touch.sample(39, 1000), Some(1));
    }

    #[test]
    fn test_touch_debounce_threshold_is_strict() {
        let mut touch = TouchDebounce::new(40, 500);
        // Genau auf der Schwelle zählt nicht als Berührung
        assert_eq!(touch.sample(40, 1000), None);
    }

    #[test]
    fn test_reset_hold_fires_after_threshold() {
        let mut hold = ResetHold::new(10_000);
        assert!(!hold.sample(true, 0));
        assert!(!hold.sample(true, 10_000));
        assert!(hold.sample(true, 10_001));
    }

    #[test]
    fn test_connection_attempt_rejects_unusable_profile() {
        let profile = NetworkProfile::default();
        assert!(ConnectionAttempt::begin(&profile, 0, 10_000).is_none());
    }
}
