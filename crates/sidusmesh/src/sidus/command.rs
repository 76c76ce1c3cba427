//! Sidus command model
//!
//! The tagged command value the codec encodes to and parses from the
//! 10-byte vendor payload. Field units follow the wire protocol:
//! intensity in tenths of a percent (0..=1000), CCT in units of 10 K for
//! CCT commands and 50 K for HSI, green/magenta shift 0..=200 around a
//! neutral 100.

use super::constants::*;
use thiserror::Error;

/// Errors produced by the Sidus codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidusError {
    #[error("payload too short: {0} bytes")]
    Truncated(usize),

    #[error("checksum mismatch")]
    Checksum,

    #[error("unknown command type {0}")]
    UnknownCommandType(u8),

    #[error("unknown effect type {0}")]
    UnknownEffectType(u8),

    #[error("access payload carries no sidus opcode")]
    MissingOpcode,
}

/// Colour-temperature command parameters (command type 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CctCommand {
    /// Light output in tenths of a percent, 0..=1000
    pub intensity: u16,
    /// Colour temperature in units of 10 K, 180..=2000
    pub cct: u16,
    /// Green/magenta shift, 0..=200
    pub gm: u8,
    /// Selects the fine G/M encoding; coarse mode stores round(gm / 10)
    pub gm_flag: bool,
    /// true powers the light on
    pub sleep_mode: bool,
    /// Firmware auto-patch opt-in bit carried verbatim
    pub auto_patch: bool,
}

/// Hue/saturation/intensity command parameters (command type 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsiCommand {
    /// Light output in tenths of a percent, 0..=1000
    pub intensity: u16,
    /// Hue in degrees, 0..=360
    pub hue: u16,
    /// Saturation in percent, 0..=100
    pub saturation: u8,
    /// Colour temperature in units of 50 K
    pub cct: u16,
    /// Green/magenta shift, 0..=200
    pub gm: u8,
    pub gm_flag: bool,
    pub sleep_mode: bool,
    pub auto_patch: bool,
}

/// Lighting effect command parameters (command type 7)
///
/// Variants are grouped by wire layout; the effect type byte
/// distinguishes members of a shared layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCommand {
    Paparazzi {
        intensity: u16,
        cct: u16,
        gm: u8,
        frq: u8,
    },
    Lightning {
        intensity: u16,
        cct: u16,
        gm: u8,
        frq: u8,
        speed: u8,
        trigger: u8,
    },
    Candle {
        intensity: u16,
        cct: u16,
        frq: u8,
    },
    Fire {
        intensity: u16,
        cct: u16,
        frq: u8,
    },
    Tv {
        intensity: u16,
        cct: u16,
        frq: u8,
    },
    Strobe {
        intensity: u16,
        effect_mode: u8,
        cct: u16,
        gm: u8,
        trigger: u8,
    },
    Explosion {
        intensity: u16,
        effect_mode: u8,
        cct: u16,
        gm: u8,
        trigger: u8,
    },
    FaultyBulb {
        intensity: u16,
        effect_mode: u8,
        cct: u16,
        gm: u8,
        speed: u8,
        trigger: u8,
    },
    Pulsing {
        intensity: u16,
        effect_mode: u8,
        cct: u16,
        gm: u8,
        speed: u8,
        trigger: u8,
    },
    Welding {
        intensity: u16,
        effect_mode: u8,
        cct: u16,
        gm: u8,
        min: u8,
        trigger: u8,
    },
    CopCar {
        intensity: u16,
        colour: u8,
    },
    Party {
        intensity: u16,
        saturation: u8,
    },
    Fireworks {
        intensity: u16,
        pattern: u8,
    },
    Off,
}

impl EffectCommand {
    /// The effect type byte carried in the payload footer
    pub fn effect_type(&self) -> u8 {
        match self {
            EffectCommand::Paparazzi { .. } => EFFECT_TYPE_PAPARAZZI,
            EffectCommand::Lightning { .. } => EFFECT_TYPE_LIGHTNING,
            EffectCommand::Candle { .. } => EFFECT_TYPE_CANDLE,
            EffectCommand::Fire { .. } => EFFECT_TYPE_FIRE,
            EffectCommand::Tv { .. } => EFFECT_TYPE_TV,
            EffectCommand::Strobe { .. } => EFFECT_TYPE_STROBE,
            EffectCommand::Explosion { .. } => EFFECT_TYPE_EXPLOSION,
            EffectCommand::FaultyBulb { .. } => EFFECT_TYPE_FAULTY_BULB,
            EffectCommand::Pulsing { .. } => EFFECT_TYPE_PULSING,
            EffectCommand::Welding { .. } => EFFECT_TYPE_WELDING,
            EffectCommand::CopCar { .. } => EFFECT_TYPE_COP_CAR,
            EffectCommand::Party { .. } => EFFECT_TYPE_PARTY,
            EffectCommand::Fireworks { .. } => EFFECT_TYPE_FIREWORKS,
            EffectCommand::Off => EFFECT_TYPE_OFF,
        }
    }
}

/// A Sidus light command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidusCommand {
    Cct(CctCommand),
    Hsi(HsiCommand),
    /// Power command (type 12); true powers on, false powers off
    Sleep { sleep_mode: bool },
    Effect(EffectCommand),
}

impl SidusCommand {
    /// The command type byte of this variant
    pub fn command_type(&self) -> u8 {
        match self {
            SidusCommand::Cct(_) => COMMAND_TYPE_CCT,
            SidusCommand::Hsi(_) => COMMAND_TYPE_HSI,
            SidusCommand::Sleep { .. } => COMMAND_TYPE_SLEEP,
            SidusCommand::Effect(_) => COMMAND_TYPE_EFFECT,
        }
    }
}

/// Parsed view of a status payload published by a light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidusStatus {
    /// Command type of the underlying payload
    pub command_type: u8,
    /// Light output in percent
    pub intensity_pct: f32,
    /// Whether the light reports itself powered on
    pub is_on: bool,
    /// Colour temperature in kelvin, when the mode carries one
    pub cct_kelvin: Option<u16>,
    /// Hue in degrees (HSI only)
    pub hue: Option<u16>,
    /// Saturation in percent (HSI only)
    pub saturation: Option<u8>,
}

impl From<&SidusCommand> for SidusStatus {
    fn from(command: &SidusCommand) -> Self {
        match command {
            SidusCommand::Cct(cct) => SidusStatus {
                command_type: COMMAND_TYPE_CCT,
                intensity_pct: f32::from(cct.intensity) / 10.0,
                is_on: cct.sleep_mode,
                cct_kelvin: Some(cct.cct * 10),
                hue: None,
                saturation: None,
            },
            SidusCommand::Hsi(hsi) => SidusStatus {
                command_type: COMMAND_TYPE_HSI,
                intensity_pct: f32::from(hsi.intensity) / 10.0,
                is_on: hsi.sleep_mode,
                cct_kelvin: Some(hsi.cct * 50),
                hue: Some(hsi.hue),
                saturation: Some(hsi.saturation),
            },
            SidusCommand::Sleep { sleep_mode } => SidusStatus {
                command_type: COMMAND_TYPE_SLEEP,
                intensity_pct: 0.0,
                is_on: *sleep_mode,
                cct_kelvin: None,
                hue: None,
                saturation: None,
            },
            SidusCommand::Effect(effect) => SidusStatus {
                command_type: COMMAND_TYPE_EFFECT,
                intensity_pct: f32::from(effect_intensity(effect)) / 10.0,
                is_on: !matches!(effect, EffectCommand::Off),
                cct_kelvin: None,
                hue: None,
                saturation: None,
            },
        }
    }
}

fn effect_intensity(effect: &EffectCommand) -> u16 {
    match *effect {
        EffectCommand::Paparazzi { intensity, .. }
        | EffectCommand::Lightning { intensity, .. }
        | EffectCommand::Candle { intensity, .. }
        | EffectCommand::Fire { intensity, .. }
        | EffectCommand::Tv { intensity, .. }
        | EffectCommand::Strobe { intensity, .. }
        | EffectCommand::Explosion { intensity, .. }
        | EffectCommand::FaultyBulb { intensity, .. }
        | EffectCommand::Pulsing { intensity, .. }
        | EffectCommand::Welding { intensity, .. }
        | EffectCommand::CopCar { intensity, .. }
        | EffectCommand::Party { intensity, .. }
        | EffectCommand::Fireworks { intensity, .. } => intensity,
        EffectCommand::Off => 0,
    }
}
