// Hardware Abstraction Layer (HAL) Module
//
// Dieses Modul kapselt Hardware-Zugriffe hinter den Traits aus esp-core,
// um Testbarkeit und Wartbarkeit zu verbessern.

pub mod storage;
pub mod touch;

pub use storage::FlashConfigStore;
pub use touch::AdcTouchSensor;
