//! Core Types für den WiFi-Manager
//!
//! Datenstrukturen ohne Hardware-Dependencies

/// Maximale Länge eines gespeicherten Konfigurationswertes (SSID, Passwort,
/// IP, Gateway). Werte werden beim Schreiben hart abgeschnitten.
pub const MAX_VALUE_LEN: usize = 64;

/// Maximale Länge einer Log-/Broadcast-Zeile
pub const MAX_LINE_LEN: usize = 128;

/// Ein einzelner Konfigurationswert aus dem Config Store
pub type ConfigValue = heapless::String<MAX_VALUE_LEN>;

/// Eine Zeile für Logfile und WebSocket-Broadcast
pub type LogLine = heapless::String<MAX_LINE_LEN>;

/// Netzwerk-Profil aus den vier persistierten Werten
///
/// Wird beim Boot aus dem Config Store geladen oder vom Provisioning-Portal
/// geschrieben. Die vier Felder liegen als getrennte Slots im Flash -
/// Teilschreibungen bei Stromausfall zwischen zwei Feldern sind möglich.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetworkProfile {
    pub ssid: ConfigValue,
    pub pass: ConfigValue,
    pub ip: ConfigValue,
    pub gateway: ConfigValue,
}

impl NetworkProfile {
    /// Ein Profil ist nur nutzbar, wenn SSID und IP-Adresse gesetzt sind.
    /// Passwort (offenes Netz) und Gateway dürfen fehlen.
    pub fn is_usable(&self) -> bool {
        !self.ssid.is_empty() && !self.ip.is_empty()
    }
}

/// Formular-Daten vom Provisioning-Portal (POST /)
///
/// Alle vier Felder sind optional: fehlende Felder lassen den gespeicherten
/// Wert unverändert (Partial-Update, kein Full-Replace). Inhaltliche
/// Validierung findet nicht statt - was geschickt wird, wird gespeichert.
#[derive(Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProvisionForm {
    pub ssid: Option<ConfigValue>,
    pub pass: Option<ConfigValue>,
    pub ip: Option<ConfigValue>,
    pub gateway: Option<ConfigValue>,
}

/// Eingehende WebSocket-Kommandos
///
/// Exakter, case-sensitiver String-Match. Alles andere wird ignoriert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WsCommand {
    /// Logfile löschen
    ClearMeasurements,
    /// Alle vier Konfigurations-Slots löschen
    ClearConfiguration,
}

impl core::convert::TryFrom<&str> for WsCommand {
    type Error = ();

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        match text {
            "clear_measurements" => Ok(Self::ClearMeasurements),
            "clear_configuration" => Ok(Self::ClearConfiguration),
            _ => Err(()),
        }
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for WsCommand {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            WsCommand::ClearMeasurements => defmt::write!(fmt, "ClearMeasurements"),
            WsCommand::ClearConfiguration => defmt::write!(fmt, "ClearConfiguration"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NetworkProfile {
    fn format(&self, fmt: defmt::Formatter) {
        // Passwort wird bewusst nicht geloggt
        defmt::write!(
            fmt,
            "NetworkProfile {{ ssid: {}, ip: {}, gateway: {} }}",
            self.ssid.as_str(),
            self.ip.as_str(),
            self.gateway.as_str()
        )
    }
}
