//! ESP Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits, Datentypen und die komplette Zustands- und
//! Timing-Logik (Debounce, Reset-Timer, Verbindungs-Deadline,
//! Kommando-Dispatch), damit alles auf dem Host testbar bleibt.

#![no_std]

pub mod logic;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use logic::{
    ConnectPoll, ConnectionAttempt, ResetHold, STATE_PLACEHOLDER, TouchDebounce, apply_submission,
    clear_configuration, clear_log, dispatch_command, first_line, format_counter, load_profile,
    render_state_template,
};
pub use traits::{ConfigStore, GATEWAY_PATH, IP_PATH, LOG_PATH, PASS_PATH, SSID_PATH, TouchSensor};
pub use types::{ConfigValue, LogLine, NetworkProfile, ProvisionForm, WsCommand};
