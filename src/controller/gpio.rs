//! Raspberry Pi GPIO sampler. Buttons are wired to ground with the internal
//! pull-up enabled, so a pressed button reads low.

use super::input::{RawInputFrame, Sampler, SamplerError};
use rppal::gpio::{Gpio, InputPin};
use tracing::{error, info};

pub struct GpioSampler {
    // Digital index == position in this list
    pins: Vec<InputPin>,
}

impl GpioSampler {
    /// Claims the given BCM pins as pull-up inputs
    pub fn create(bcm_pins: &[u8]) -> Result<Self, SamplerError> {
        let gpio = Gpio::new().map_err(|e| {
            error!("Failed to open GPIO: {}", e);
            SamplerError::Read(e.to_string())
        })?;

        let mut pins = Vec::with_capacity(bcm_pins.len());
        for bcm in bcm_pins {
            let pin = gpio
                .get(*bcm)
                .map_err(|e| SamplerError::Read(format!("GPIO{}: {}", bcm, e)))?;
            pins.push(pin.into_input_pullup());
        }

        info!("GPIO sampler ready on pins {:?}", bcm_pins);
        Ok(Self { pins })
    }
}

impl Sampler for GpioSampler {
    fn poll(&mut self) -> Result<RawInputFrame, SamplerError> {
        Ok(RawInputFrame {
            digital: self.pins.iter().map(|pin| pin.is_low()).collect(),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "gpio"
    }
}
