// Flash Config Store - persistiert Konfigurations-Slots und Logdatei
//
// Implementiert den ConfigStore-Trait aus esp-core auf den letzten
// Flash-Sektoren. Layout siehe config.rs: ein 4-KiB-Sektor pro
// Config-Slot, dahinter eine append-only Log-Region.

use defmt::{info, warn};
use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;

use esp_core::types::{MAX_LINE_LEN, MAX_VALUE_LEN};
use esp_core::{ConfigValue, GATEWAY_PATH, IP_PATH, LOG_PATH, PASS_PATH, SSID_PATH, first_line};

use crate::config::{CONFIG_SLOT_SECTORS, STORE_TOTAL_SECTORS};

/// Kennung eines belegten Config-Slots
const SLOT_MAGIC: u32 = 0x5752_4D47; // "GMRW" little-endian

/// Header eines Slot-Records: Magic (4) + Länge (2)
const SLOT_HEADER_LEN: usize = 6;

/// Header eines Log-Records: Länge (2)
const LOG_HEADER_LEN: usize = 2;

/// Markierung einer freien Stelle in der Log-Region (gelöschter Flash)
const LOG_FREE: u16 = 0xFFFF;

/// Chunk-Größe beim Löschen von Regionen (klein halten, Stack!)
const WIPE_CHUNK: usize = 256;

/// Flash-basierter Config Store
///
/// Schreiboperationen laufen über den embedded-storage `Storage`-Trait,
/// der Read-Modify-Write auf Sektor-Ebene intern übernimmt. Fehler werden
/// geloggt und verschluckt - die Trait-Aufrufer bekommen nur die
/// best-effort Semantik aus esp-core.
pub struct FlashConfigStore<'d> {
    flash: FlashStorage<'d>,
    /// Start der reservierten Region (erster Config-Slot)
    base: u32,
    /// Start der Log-Region
    log_start: u32,
    /// Ende der Log-Region (exklusiv)
    log_end: u32,
    /// Nächste freie Schreibposition in der Log-Region
    log_cursor: u32,
    /// Mount fehlgeschlagen: alle Reads leer, alle Writes verworfen
    degraded: bool,
}

impl<'d> FlashConfigStore<'d> {
    pub fn new(flash_peripheral: esp_hal::peripherals::FLASH<'d>) -> Self {
        let mut flash = FlashStorage::new(flash_peripheral);
        let sector = FlashStorage::SECTOR_SIZE;
        let capacity = flash.capacity() as u32;
        let reserve = STORE_TOTAL_SECTORS * sector;

        let degraded = capacity < reserve;
        if degraded {
            // Entspricht einem fehlgeschlagenen SPIFFS-Mount: das Gerät
            // läuft weiter, nur ohne Persistenz
            warn!("Store: flash too small, running degraded (no persistence)");
        }

        let base = capacity.saturating_sub(reserve);
        let log_start = base + CONFIG_SLOT_SECTORS * sector;
        let log_end = capacity;
        let log_cursor = if degraded {
            log_start
        } else {
            Self::scan_log_cursor(&mut flash, log_start, log_end)
        };

        info!(
            "Store: mounted, {} config slots, log {}/{} bytes used",
            CONFIG_SLOT_SECTORS,
            log_cursor - log_start,
            log_end - log_start
        );

        Self {
            flash,
            base,
            log_start,
            log_end,
            log_cursor,
            degraded,
        }
    }

    /// Sucht beim Boot die erste freie Schreibposition in der Log-Region
    fn scan_log_cursor(flash: &mut FlashStorage<'d>, log_start: u32, log_end: u32) -> u32 {
        let mut cursor = log_start;
        loop {
            if cursor + LOG_HEADER_LEN as u32 > log_end {
                return log_end;
            }
            let mut header = [0u8; LOG_HEADER_LEN];
            if flash.read(cursor, &mut header).is_err() {
                warn!("Store: log scan read failed at {}", cursor);
                return log_end;
            }
            let len = u16::from_le_bytes(header);
            if len == LOG_FREE {
                return cursor;
            }
            if len as usize > MAX_LINE_LEN {
                // Inkonsistenter Record: Region gilt als voll, weitere
                // Appends werden verworfen statt Daten zu überschreiben
                warn!("Store: corrupt log record at {}, log frozen", cursor);
                return log_end;
            }
            cursor += (LOG_HEADER_LEN + len as usize) as u32;
        }
    }

    /// Flash-Offset des Sektors für einen Config-Pfad
    fn slot_offset(&self, path: &str) -> Option<u32> {
        let index = match path {
            SSID_PATH => 0u32,
            PASS_PATH => 1,
            IP_PATH => 2,
            GATEWAY_PATH => 3,
            _ => return None,
        };
        Some(self.base + index * FlashStorage::SECTOR_SIZE)
    }

    /// Liest den Slot-Record an `offset`, `None` wenn leer/ungültig
    fn load_slot(&mut self, offset: u32) -> Option<ConfigValue> {
        let mut record = [0u8; SLOT_HEADER_LEN + MAX_VALUE_LEN];
        self.flash.read(offset, &mut record).ok()?;

        let magic = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        if magic != SLOT_MAGIC {
            return None;
        }
        let len = u16::from_le_bytes([record[4], record[5]]) as usize;
        if len > MAX_VALUE_LEN {
            return None;
        }
        let content = core::str::from_utf8(&record[SLOT_HEADER_LEN..SLOT_HEADER_LEN + len]).ok()?;
        let mut value = ConfigValue::new();
        let _ = value.push_str(first_line(content));
        Some(value)
    }

    /// Überschreibt einen Bereich chunk-weise mit 0xFF (gelöschter Zustand)
    fn wipe_range(&mut self, start: u32, end: u32) {
        let blank = [0xFFu8; WIPE_CHUNK];
        let mut offset = start;
        while offset < end {
            let chunk = core::cmp::min(WIPE_CHUNK as u32, end - offset) as usize;
            if self.flash.write(offset, &blank[..chunk]).is_err() {
                warn!("Store: wipe failed at {}", offset);
                return;
            }
            offset += chunk as u32;
        }
    }

    /// Komplettes Log als ein String (für GET /log.txt)
    pub fn read_log(&mut self) -> alloc::string::String {
        let mut out = alloc::string::String::new();
        if self.degraded {
            return out;
        }

        let mut offset = self.log_start;
        while offset < self.log_cursor {
            let mut header = [0u8; LOG_HEADER_LEN];
            if self.flash.read(offset, &mut header).is_err() {
                break;
            }
            let len = u16::from_le_bytes(header) as usize;
            if len == LOG_FREE as usize || len > MAX_LINE_LEN {
                break;
            }
            let mut buf = [0u8; MAX_LINE_LEN];
            if self
                .flash
                .read(offset + LOG_HEADER_LEN as u32, &mut buf[..len])
                .is_err()
            {
                break;
            }
            if let Ok(line) = core::str::from_utf8(&buf[..len]) {
                out.push_str(line);
                out.push('\n');
            }
            offset += (LOG_HEADER_LEN + len) as u32;
        }
        out
    }
}

impl esp_core::ConfigStore for FlashConfigStore<'_> {
    fn read(&mut self, path: &str) -> ConfigValue {
        if self.degraded {
            return ConfigValue::new();
        }
        if path == LOG_PATH {
            // Erste Zeile des Logs, gleiche First-Line-Semantik wie Slots
            let log = self.read_log();
            let mut value = ConfigValue::new();
            let line = first_line(&log);
            let _ = value.push_str(&line[..core::cmp::min(line.len(), MAX_VALUE_LEN)]);
            return value;
        }
        match self.slot_offset(path) {
            Some(offset) => self.load_slot(offset).unwrap_or_default(),
            None => ConfigValue::new(),
        }
    }

    fn write(&mut self, path: &str, content: &str) {
        if self.degraded {
            return;
        }
        let Some(offset) = self.slot_offset(path) else {
            warn!("Store: write to unknown path {}", path);
            return;
        };

        // Auf Slot-Größe kürzen, ohne UTF-8-Zeichen zu zerschneiden
        let mut end = core::cmp::min(content.len(), MAX_VALUE_LEN);
        while end > 0 && !content.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = &content.as_bytes()[..end];

        let mut record = [0xFFu8; SLOT_HEADER_LEN + MAX_VALUE_LEN];
        record[0..4].copy_from_slice(&SLOT_MAGIC.to_le_bytes());
        record[4..6].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
        record[SLOT_HEADER_LEN..SLOT_HEADER_LEN + bytes.len()].copy_from_slice(bytes);

        if self
            .flash
            .write(offset, &record[..SLOT_HEADER_LEN + bytes.len()])
            .is_err()
        {
            warn!("Store: write failed for {}", path);
        } else {
            info!("Store: wrote {} ({} bytes)", path, bytes.len());
        }
    }

    fn append_line(&mut self, path: &str, line: &str) {
        if self.degraded {
            return;
        }
        if path != LOG_PATH {
            warn!("Store: append to unknown path {}", path);
            return;
        }

        let mut end = core::cmp::min(line.len(), MAX_LINE_LEN);
        while end > 0 && !line.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = &line.as_bytes()[..end];

        let needed = (LOG_HEADER_LEN + bytes.len()) as u32;
        if self.log_cursor + needed > self.log_end {
            warn!("Store: log region full, dropping entry");
            return;
        }

        let mut record = [0u8; LOG_HEADER_LEN + MAX_LINE_LEN];
        record[0..2].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
        record[LOG_HEADER_LEN..LOG_HEADER_LEN + bytes.len()].copy_from_slice(bytes);

        if self
            .flash
            .write(self.log_cursor, &record[..LOG_HEADER_LEN + bytes.len()])
            .is_err()
        {
            warn!("Store: log append failed");
            return;
        }
        self.log_cursor += needed;
    }

    fn remove(&mut self, path: &str) -> bool {
        if self.degraded {
            return false;
        }
        if path == LOG_PATH {
            if self.log_cursor == self.log_start {
                // Logdatei existiert nicht
                return false;
            }
            let used_end = self.log_cursor;
            self.wipe_range(self.log_start, used_end);
            self.log_cursor = self.log_start;
            info!("Store: removed {}", path);
            return true;
        }

        let Some(offset) = self.slot_offset(path) else {
            return false;
        };
        if self.load_slot(offset).is_none() {
            // Fehlende Datei ist kein erfolgreicher Löschvorgang
            return false;
        }
        // Magic ungültig machen reicht - der Slot gilt danach als leer
        let blank_magic = [0u8; 4];
        if self.flash.write(offset, &blank_magic).is_err() {
            warn!("Store: remove failed for {}", path);
            return false;
        }
        info!("Store: removed {}", path);
        true
    }

    fn erase_all(&mut self) {
        if self.degraded {
            return;
        }
        info!("Store: erasing entire filesystem");
        let end = self.log_end;
        self.wipe_range(self.base, end);
        self.log_cursor = self.log_start;
    }
}
