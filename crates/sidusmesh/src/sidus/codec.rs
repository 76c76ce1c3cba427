//! Encoder and parser for the 10-byte Sidus payload
//!
//! Encoding writes each layout's fields in emission order through the
//! LSB-first [`BitWriter`], then overwrites byte 0 with the checksum
//! `sum(bytes[1..=9]) mod 256`. Parsing verifies the checksum and walks
//! the same layout from the tail. Out-of-range inputs are clamped to the
//! legal wire ranges on encode.

use super::bits::{BitReader, BitWriter};
use super::command::{CctCommand, EffectCommand, HsiCommand, SidusCommand, SidusError, SidusStatus};
use super::constants::*;

/// Checksum over bytes 1..=9 of a Sidus payload
pub fn checksum(payload: &[u8]) -> u8 {
    payload[1..SIDUS_PAYLOAD_LEN]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Locate the 10-byte Sidus payload inside an access payload
///
/// Both prefix forms seen on the wire are accepted: the full vendor
/// opcode `C0 11 02 26` and the bare sub-opcode `26`.
pub fn vendor_payload(access: &[u8]) -> Result<&[u8], SidusError> {
    if access.starts_with(&SIDUS_VENDOR_OPCODE) {
        Ok(&access[SIDUS_VENDOR_OPCODE.len()..])
    } else if access.first() == Some(&SIDUS_SUB_OPCODE) {
        Ok(&access[1..])
    } else {
        Err(SidusError::MissingOpcode)
    }
}

/// Parse a status access payload published by a light
///
/// Version responses and other variant payloads fail the checksum and
/// come back as errors; callers discard them without surfacing anything.
pub fn parse_status(access: &[u8]) -> Result<SidusStatus, SidusError> {
    let payload = vendor_payload(access)?;
    let command = SidusCommand::parse(payload)?;
    Ok(SidusStatus::from(&command))
}

impl SidusCommand {
    /// Encode into the 10-byte bit-packed payload
    pub fn encode(&self) -> [u8; SIDUS_PAYLOAD_LEN] {
        let mut w = BitWriter::new();

        match self {
            SidusCommand::Cct(cct) => encode_cct(&mut w, cct),
            SidusCommand::Hsi(hsi) => encode_hsi(&mut w, hsi),
            SidusCommand::Sleep { sleep_mode } => encode_sleep(&mut w, *sleep_mode),
            SidusCommand::Effect(effect) => encode_effect(&mut w, effect),
        }

        let mut payload = w.finish();
        payload[0] = checksum(&payload);
        payload
    }

    /// Parse a 10-byte payload back into a command
    ///
    /// Fails on short input, checksum mismatch, or unrecognized command
    /// or effect types; checksum failures never yield parsed data.
    pub fn parse(payload: &[u8]) -> Result<Self, SidusError> {
        if payload.len() < SIDUS_PAYLOAD_LEN {
            return Err(SidusError::Truncated(payload.len()));
        }
        let payload = &payload[..SIDUS_PAYLOAD_LEN];
        if payload[0] != checksum(payload) {
            return Err(SidusError::Checksum);
        }

        let mut r = BitReader::new(payload);
        let _opera_type = r.read_back(1);
        let command_type = r.read_back(7) as u8;

        match command_type {
            COMMAND_TYPE_CCT => Ok(SidusCommand::Cct(parse_cct(&mut r))),
            COMMAND_TYPE_HSI => Ok(SidusCommand::Hsi(parse_hsi(&mut r))),
            COMMAND_TYPE_SLEEP => Ok(parse_sleep(&mut r)),
            COMMAND_TYPE_EFFECT => parse_effect(&mut r).map(SidusCommand::Effect),
            other => Err(SidusError::UnknownCommandType(other)),
        }
    }
}

fn split_cct(kelvin_units: u32, divisor: u32) -> (u32, u32) {
    let scaled = kelvin_units * divisor;
    if scaled > 10_000 {
        (1, (scaled - 10_000) / divisor)
    } else {
        (0, scaled / divisor)
    }
}

fn split_gm(gm: u16, gm_flag: bool) -> (u32, u32) {
    if !gm_flag {
        // Coarse mode: one unit per 10 on the wire.
        (0, u32::from((gm + 5) / 10))
    } else if gm > 100 {
        (1, u32::from(gm - 100))
    } else {
        (0, u32::from(gm))
    }
}

fn encode_cct(w: &mut BitWriter, cmd: &CctCommand) {
    let intensity = cmd.intensity.min(INTENSITY_MAX);
    let cct = cmd.cct.clamp(CCT_MIN, CCT_MAX);
    let gm = u16::from(cmd.gm).min(GM_MAX);

    let (cct_high, cct_value) = split_cct(u32::from(cct), 10);
    let (gm_high, gm_value) = split_gm(gm, cmd.gm_flag);

    w.skip(8); // checksum slot
    w.write(u32::from(cmd.sleep_mode), 1);
    w.skip(20);
    w.skip(12);
    w.write(u32::from(cmd.auto_patch), 1);
    w.write(cct_high, 1);
    w.write(u32::from(cmd.gm_flag), 1);
    w.write(gm_high, 1);
    w.write(gm_value, 7);
    w.write(cct_value, 10);
    w.write(u32::from(intensity), 10);
    w.write(u32::from(COMMAND_TYPE_CCT), 7);
    w.write(1, 1);
}

fn encode_hsi(w: &mut BitWriter, cmd: &HsiCommand) {
    let intensity = cmd.intensity.min(INTENSITY_MAX);
    let hue = cmd.hue.min(HUE_MAX);
    let saturation = cmd.saturation.min(SATURATION_MAX);
    let cct = cmd.cct.min(455); // 8-bit value plus the high-range offset
    let gm = u16::from(cmd.gm).min(GM_MAX);

    let (cct_high, cct_value) = split_cct(u32::from(cct), 50);
    let (gm_high, gm_value) = split_gm(gm, cmd.gm_flag);

    w.skip(8);
    w.write(u32::from(cmd.sleep_mode), 1);
    w.skip(18);
    w.write(u32::from(cmd.auto_patch), 1);
    w.write(cct_high, 1);
    w.write(u32::from(cmd.gm_flag), 1);
    w.write(gm_high, 1);
    w.write(gm_value, 7);
    w.write(cct_value, 8);
    w.write(u32::from(saturation), 7);
    w.write(u32::from(hue), 9);
    w.write(u32::from(intensity), 10);
    w.write(u32::from(COMMAND_TYPE_HSI), 7);
    w.write(1, 1);
}

fn encode_sleep(w: &mut BitWriter, sleep_mode: bool) {
    // CCT layout with every colour field zeroed; only the sleep bit and
    // the command type differ between payloads.
    w.skip(8);
    w.write(u32::from(sleep_mode), 1);
    w.skip(20);
    w.skip(12);
    w.skip(4); // auto patch, cct high, gm flag, gm high
    w.skip(7); // gm value
    w.skip(10); // cct value
    w.skip(10); // intensity
    w.write(u32::from(COMMAND_TYPE_SLEEP), 7);
    w.write(1, 1);
}

fn encode_effect(w: &mut BitWriter, effect: &EffectCommand) {
    w.skip(8);

    match *effect {
        EffectCommand::Paparazzi {
            intensity,
            cct,
            gm,
            frq,
        } => {
            w.skip(25);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(gm.min(127)), 7);
            w.write(u32::from(frq.min(15)), 4);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Lightning {
            intensity,
            cct,
            gm,
            frq,
            speed,
            trigger,
        } => {
            w.skip(19);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(gm.min(127)), 7);
            w.write(u32::from(speed.min(15)), 4);
            w.write(u32::from(trigger.min(3)), 2);
            w.write(u32::from(frq.min(15)), 4);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Candle {
            intensity,
            cct,
            frq,
        }
        | EffectCommand::Fire {
            intensity,
            cct,
            frq,
        }
        | EffectCommand::Tv {
            intensity,
            cct,
            frq,
        } => {
            w.skip(32);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(frq.min(15)), 4);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Strobe {
            intensity,
            effect_mode,
            cct,
            gm,
            trigger,
        }
        | EffectCommand::Explosion {
            intensity,
            effect_mode,
            cct,
            gm,
            trigger,
        } => {
            w.skip(23);
            w.write(u32::from(effect_mode.min(15)), 4);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(gm.min(127)), 7);
            w.write(u32::from(trigger.min(3)), 2);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::FaultyBulb {
            intensity,
            effect_mode,
            cct,
            gm,
            speed,
            trigger,
        }
        | EffectCommand::Pulsing {
            intensity,
            effect_mode,
            cct,
            gm,
            speed,
            trigger,
        } => {
            w.skip(19);
            w.write(u32::from(effect_mode.min(15)), 4);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(gm.min(127)), 7);
            w.write(u32::from(speed.min(15)), 4);
            w.write(u32::from(trigger.min(3)), 2);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Welding {
            intensity,
            effect_mode,
            cct,
            gm,
            min,
            trigger,
        } => {
            w.skip(16);
            w.write(u32::from(effect_mode.min(15)), 4);
            w.write(u32::from(cct.min(1023)), 10);
            w.write(u32::from(gm.min(127)), 7);
            w.write(u32::from(min.min(127)), 7);
            w.write(u32::from(trigger.min(3)), 2);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::CopCar { intensity, colour } => {
            w.skip(42);
            w.write(u32::from(colour.min(15)), 4);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Party {
            intensity,
            saturation,
        } => {
            w.skip(39);
            w.write(u32::from(saturation.min(SATURATION_MAX)), 7);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Fireworks { intensity, pattern } => {
            w.skip(38);
            w.write(u32::from(pattern), 8);
            w.write(u32::from(intensity.min(INTENSITY_MAX)), 10);
        }
        EffectCommand::Off => {
            w.skip(56);
        }
    }

    w.write(u32::from(effect.effect_type()), 8);
    w.write(u32::from(COMMAND_TYPE_EFFECT), 7);
    w.write(1, 1);
}

fn parse_cct(r: &mut BitReader) -> CctCommand {
    let intensity = r.read_back(10) as u16;
    let cct_value = r.read_back(10) as u16;
    let gm_value = r.read_back(7) as u16;
    let gm_high = r.read_back(1) == 1;
    let gm_flag = r.read_back(1) == 1;
    let cct_high = r.read_back(1) == 1;
    let auto_patch = r.read_back(1) == 1;
    r.skip_back(12);
    r.skip_back(20);
    let sleep_mode = r.read_back(1) == 1;

    let cct = cct_value + if cct_high { 1000 } else { 0 };
    let gm = join_gm(gm_value, gm_high, gm_flag);

    CctCommand {
        intensity,
        cct,
        gm,
        gm_flag,
        sleep_mode,
        auto_patch,
    }
}

fn parse_hsi(r: &mut BitReader) -> HsiCommand {
    let intensity = r.read_back(10) as u16;
    let hue = r.read_back(9) as u16;
    let saturation = r.read_back(7) as u8;
    let cct_value = r.read_back(8) as u16;
    let gm_value = r.read_back(7) as u16;
    let gm_high = r.read_back(1) == 1;
    let gm_flag = r.read_back(1) == 1;
    let cct_high = r.read_back(1) == 1;
    let auto_patch = r.read_back(1) == 1;
    r.skip_back(18);
    let sleep_mode = r.read_back(1) == 1;

    let cct = cct_value + if cct_high { 200 } else { 0 };
    let gm = join_gm(gm_value, gm_high, gm_flag);

    HsiCommand {
        intensity,
        hue,
        saturation,
        cct,
        gm,
        gm_flag,
        sleep_mode,
        auto_patch,
    }
}

fn parse_sleep(r: &mut BitReader) -> SidusCommand {
    r.skip_back(10); // intensity
    r.skip_back(10); // cct value
    r.skip_back(7); // gm value
    r.skip_back(4); // flag bits
    r.skip_back(12);
    r.skip_back(20);
    let sleep_mode = r.read_back(1) == 1;

    SidusCommand::Sleep { sleep_mode }
}

fn parse_effect(r: &mut BitReader) -> Result<EffectCommand, SidusError> {
    let effect_type = r.read_back(8) as u8;

    let effect = match effect_type {
        EFFECT_TYPE_PAPARAZZI => {
            let intensity = r.read_back(10) as u16;
            let frq = r.read_back(4) as u8;
            let gm = r.read_back(7) as u8;
            let cct = r.read_back(10) as u16;
            EffectCommand::Paparazzi {
                intensity,
                cct,
                gm,
                frq,
            }
        }
        EFFECT_TYPE_LIGHTNING => {
            let intensity = r.read_back(10) as u16;
            let frq = r.read_back(4) as u8;
            let trigger = r.read_back(2) as u8;
            let speed = r.read_back(4) as u8;
            let gm = r.read_back(7) as u8;
            let cct = r.read_back(10) as u16;
            EffectCommand::Lightning {
                intensity,
                cct,
                gm,
                frq,
                speed,
                trigger,
            }
        }
        EFFECT_TYPE_CANDLE | EFFECT_TYPE_FIRE | EFFECT_TYPE_TV => {
            let intensity = r.read_back(10) as u16;
            let frq = r.read_back(4) as u8;
            let cct = r.read_back(10) as u16;
            match effect_type {
                EFFECT_TYPE_CANDLE => EffectCommand::Candle {
                    intensity,
                    cct,
                    frq,
                },
                EFFECT_TYPE_FIRE => EffectCommand::Fire {
                    intensity,
                    cct,
                    frq,
                },
                _ => EffectCommand::Tv {
                    intensity,
                    cct,
                    frq,
                },
            }
        }
        EFFECT_TYPE_STROBE | EFFECT_TYPE_EXPLOSION => {
            let intensity = r.read_back(10) as u16;
            let trigger = r.read_back(2) as u8;
            let gm = r.read_back(7) as u8;
            let cct = r.read_back(10) as u16;
            let effect_mode = r.read_back(4) as u8;
            if effect_type == EFFECT_TYPE_STROBE {
                EffectCommand::Strobe {
                    intensity,
                    effect_mode,
                    cct,
                    gm,
                    trigger,
                }
            } else {
                EffectCommand::Explosion {
                    intensity,
                    effect_mode,
                    cct,
                    gm,
                    trigger,
                }
            }
        }
        EFFECT_TYPE_FAULTY_BULB | EFFECT_TYPE_PULSING => {
            let intensity = r.read_back(10) as u16;
            let trigger = r.read_back(2) as u8;
            let speed = r.read_back(4) as u8;
            let gm = r.read_back(7) as u8;
            let cct = r.read_back(10) as u16;
            let effect_mode = r.read_back(4) as u8;
            if effect_type == EFFECT_TYPE_FAULTY_BULB {
                EffectCommand::FaultyBulb {
                    intensity,
                    effect_mode,
                    cct,
                    gm,
                    speed,
                    trigger,
                }
            } else {
                EffectCommand::Pulsing {
                    intensity,
                    effect_mode,
                    cct,
                    gm,
                    speed,
                    trigger,
                }
            }
        }
        EFFECT_TYPE_WELDING => {
            let intensity = r.read_back(10) as u16;
            let trigger = r.read_back(2) as u8;
            let min = r.read_back(7) as u8;
            let gm = r.read_back(7) as u8;
            let cct = r.read_back(10) as u16;
            let effect_mode = r.read_back(4) as u8;
            EffectCommand::Welding {
                intensity,
                effect_mode,
                cct,
                gm,
                min,
                trigger,
            }
        }
        EFFECT_TYPE_COP_CAR => {
            let intensity = r.read_back(10) as u16;
            let colour = r.read_back(4) as u8;
            EffectCommand::CopCar { intensity, colour }
        }
        EFFECT_TYPE_PARTY => {
            let intensity = r.read_back(10) as u16;
            let saturation = r.read_back(7) as u8;
            EffectCommand::Party {
                intensity,
                saturation,
            }
        }
        EFFECT_TYPE_FIREWORKS => {
            let intensity = r.read_back(10) as u16;
            let pattern = r.read_back(8) as u8;
            EffectCommand::Fireworks { intensity, pattern }
        }
        EFFECT_TYPE_OFF => EffectCommand::Off,
        other => return Err(SidusError::UnknownEffectType(other)),
    };

    Ok(effect)
}

fn join_gm(gm_value: u16, gm_high: bool, gm_flag: bool) -> u8 {
    let gm = if gm_flag {
        if gm_high {
            gm_value + 100
        } else {
            gm_value
        }
    } else {
        gm_value * 10
    };
    gm.min(GM_MAX) as u8
}
