// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

// ============================================================================
// GPIO Konfiguration
// ============================================================================

/// GPIO-Pin für den Geräte-Ausgang (LED), Push-Pull, beim Boot LOW
pub const LED_GPIO_PIN: u8 = 8;

/// GPIO-Pin für den Reset-Knopf (interner Pull-Up, aktiv-low)
pub const RESET_GPIO_PIN: u8 = 4;

/// GPIO-Pin für den Touch-Eingang (ADC1, kleinerer Messwert = berührt)
pub const TOUCH_GPIO_PIN: u8 = 2;

// ============================================================================
// Timing & Schwellwerte
// ============================================================================

/// Abtast-Intervall der Hauptschleife (Touch + Reset-Knopf) in ms
pub const MONITOR_TICK_MS: u64 = 20;

/// Touch-Schwelle: Rohwerte UNTER diesem Wert gelten als Berührung
pub const TOUCH_THRESHOLD: u16 = 40;

/// Debounce-Fenster für Touch-Events in ms
pub const TOUCH_DEBOUNCE_MS: u64 = 500;

/// Haltezeit des Reset-Knopfs bis zum Factory-Reset in ms
pub const RESET_HOLD_MS: u64 = 10_000;

/// Timeout für den Station-Verbindungsversuch beim Boot in ms
pub const WIFI_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Poll-Intervall während des Verbindungsversuchs in ms
pub const WIFI_CONNECT_POLL_MS: u64 = 100;

/// Wartezeit nach dem Provisioning-Formular bis zum Neustart in Sekunden
/// (damit die HTTP-Antwort den Client noch erreicht)
pub const REBOOT_GRACE_SECS: u64 = 3;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// SSID des offenen Provisioning Access Points (fest einkodiert)
pub const AP_SSID: &str = "ESP-WIFI-MANAGER-Darab";

/// IPv4-Adresse des Geräts im AP-Modus (auch Gateway für Clients)
pub const AP_GATEWAY_IP: [u8; 4] = [192, 168, 4, 1];

/// Präfix-Länge des AP-Subnetzes
pub const AP_PREFIX_LEN: u8 = 24;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// Gesamt-Heap: ~100 KB für WiFi-Stack

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// HTTP-Port für Betriebs- und Provisioning-Server
pub const HTTP_PORT: u16 = 80;

/// Anzahl paralleler HTTP-Server-Task-Instanzen im Betriebsmodus
pub const HTTP_TASK_POOL: usize = 4;

/// Anzahl paralleler HTTP-Server-Task-Instanzen im Provisioning-Modus
pub const PORTAL_TASK_POOL: usize = 2;

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// WebSocket Message Buffer-Größe in Bytes
/// Die Kommandos sind kurze Text-Frames (< 32 Bytes)
pub const WEBSOCKET_BUFFER_SIZE: usize = 256;

// ============================================================================
// Event-Channel Konfiguration
// ============================================================================

/// Queue-Tiefe des Broadcast-Channels
pub const EVENT_QUEUE_DEPTH: usize = 4;

/// Maximale Anzahl Subscriber (= gleichzeitige WebSocket-Peers)
pub const EVENT_MAX_PEERS: usize = 8;

/// Maximale Anzahl Publisher (Monitor-Task + Log-Pfad)
pub const EVENT_MAX_PUBLISHERS: usize = 2;

// ============================================================================
// Flash-Layout des Config Stores
// ============================================================================
//
// Der Store belegt die letzten Sektoren des Flash:
//
//   [ ... Firmware ... | ssid | pass | ip | gateway | log (16 Sektoren) ]
//
// Jeder Config-Slot ist ein eigener 4-KiB-Sektor, damit remove()/write()
// eines Wertes die anderen nie berührt (keine Atomarität über Slots).

/// Sektoren für die vier Config-Slots
pub const CONFIG_SLOT_SECTORS: u32 = 4;

/// Sektoren für die append-only Log-Region
pub const LOG_REGION_SECTORS: u32 = 16;

/// Gesamtzahl reservierter Sektoren am Flash-Ende
pub const STORE_TOTAL_SECTORS: u32 = CONFIG_SLOT_SECTORS + LOG_REGION_SECTORS;
