// Touch-Sensor über ADC1 Oneshot
//
// Der ESP32-C6 hat kein kapazitives Touch-Peripheral; der Sensor hängt
// deshalb an einem ADC-Eingang. Polarität wie beim Original-Sensor:
// kleinerer Rohwert = berührt.

use esp_core::TouchSensor;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};

type TouchAdc = Adc<'static, esp_hal::peripherals::ADC1<'static>, esp_hal::Blocking>;
type TouchAdcPin =
    AdcPin<esp_hal::peripherals::GPIO2<'static>, esp_hal::peripherals::ADC1<'static>>;

/// ADC-basierter Touch-Sensor (Production-Implementierung des Traits)
pub struct AdcTouchSensor {
    adc: TouchAdc,
    pin: TouchAdcPin,
}

impl AdcTouchSensor {
    pub fn new(
        adc_peripheral: esp_hal::peripherals::ADC1<'static>,
        gpio2: esp_hal::peripherals::GPIO2<'static>,
    ) -> Self {
        let mut adc_config = AdcConfig::new();
        let pin = adc_config.enable_pin(gpio2, Attenuation::_11dB);
        let adc = Adc::new(adc_peripheral, adc_config);
        Self { adc, pin }
    }
}

impl TouchSensor for AdcTouchSensor {
    fn read_raw(&mut self) -> u16 {
        // Oneshot-Messung blockierend pollen; ein Messfehler liefert den
        // Maximalwert und kann damit nie als Berührung zählen
        match nb::block!(self.adc.read_oneshot(&mut self.pin)) {
            Ok(raw) => raw,
            Err(_) => u16::MAX,
        }
    }
}
