//! Tests for the Sidus codec

use super::*;

fn default_cct() -> CctCommand {
    CctCommand {
        intensity: 500,
        cct: 440,
        gm: 100,
        gm_flag: false,
        sleep_mode: true,
        auto_patch: false,
    }
}

#[test]
fn test_cct_encode_checksum_and_parse_back() {
    let payload = SidusCommand::Cct(default_cct()).encode();

    assert_eq!(payload.len(), SIDUS_PAYLOAD_LEN);
    assert_eq!(payload[0], checksum(&payload));

    let parsed = SidusCommand::parse(&payload).unwrap();
    match parsed {
        SidusCommand::Cct(cct) => {
            assert_eq!(cct.intensity, 500);
            assert_eq!(cct.cct, 440);
            assert_eq!(cct.gm, 100);
            assert!(cct.sleep_mode);
        }
        other => panic!("parsed wrong variant: {:?}", other),
    }

    let status = SidusStatus::from(&parsed);
    assert_eq!(status.command_type, COMMAND_TYPE_CCT);
    assert!((status.intensity_pct - 50.0).abs() < f32::EPSILON);
    assert!(status.is_on);
    assert_eq!(status.cct_kelvin, Some(4400));
}

#[test]
fn test_cct_high_range_round_trip() {
    let command = SidusCommand::Cct(CctCommand {
        intensity: 1000,
        cct: 1500, // 15000 K, over the 10000 K split
        gm: 150,
        gm_flag: true,
        sleep_mode: true,
        auto_patch: true,
    });

    let parsed = SidusCommand::parse(&command.encode()).unwrap();
    assert_eq!(parsed, command);
}

#[test]
fn test_hsi_round_trip() {
    let command = SidusCommand::Hsi(HsiCommand {
        intensity: 750,
        hue: 300,
        saturation: 80,
        cct: 112, // 5600 K in 50 K units
        gm: 40,
        gm_flag: true,
        sleep_mode: true,
        auto_patch: false,
    });

    let parsed = SidusCommand::parse(&command.encode()).unwrap();
    assert_eq!(parsed, command);

    let status = SidusStatus::from(&parsed);
    assert_eq!(status.cct_kelvin, Some(5600));
    assert_eq!(status.hue, Some(300));
    assert_eq!(status.saturation, Some(80));
}

#[test]
fn test_hsi_high_range_cct_round_trip() {
    let command = SidusCommand::Hsi(HsiCommand {
        intensity: 10,
        hue: 0,
        saturation: 0,
        cct: 320, // over the 200-unit split
        gm: 0,
        gm_flag: false,
        sleep_mode: true,
        auto_patch: false,
    });

    assert_eq!(SidusCommand::parse(&command.encode()).unwrap(), command);
}

#[test]
fn test_sleep_round_trip_and_single_bit_difference() {
    let on = SidusCommand::Sleep { sleep_mode: true }.encode();
    let off = SidusCommand::Sleep { sleep_mode: false }.encode();

    assert_eq!(
        SidusCommand::parse(&on).unwrap(),
        SidusCommand::Sleep { sleep_mode: true }
    );
    assert_eq!(
        SidusCommand::parse(&off).unwrap(),
        SidusCommand::Sleep { sleep_mode: false }
    );

    // The payloads differ only in the sleep bit (and the checksum that
    // covers it).
    let differing: Vec<usize> = (1..SIDUS_PAYLOAD_LEN).filter(|&i| on[i] != off[i]).collect();
    assert_eq!(differing, vec![1]);
    assert_eq!(on[1] ^ off[1], 0x01);

    match SidusCommand::parse(&on).unwrap() {
        SidusCommand::Sleep { sleep_mode } => assert!(sleep_mode),
        other => panic!("parsed wrong variant: {:?}", other),
    }
}

#[test]
fn test_every_effect_round_trips() {
    let effects = [
        EffectCommand::Paparazzi {
            intensity: 600,
            cct: 550,
            gm: 90,
            frq: 9,
        },
        EffectCommand::Lightning {
            intensity: 1000,
            cct: 650,
            gm: 30,
            frq: 12,
            speed: 7,
            trigger: 2,
        },
        EffectCommand::Candle {
            intensity: 200,
            cct: 190,
            frq: 3,
        },
        EffectCommand::Fire {
            intensity: 350,
            cct: 220,
            frq: 5,
        },
        EffectCommand::Tv {
            intensity: 420,
            cct: 700,
            frq: 8,
        },
        EffectCommand::Strobe {
            intensity: 900,
            effect_mode: 2,
            cct: 560,
            gm: 100,
            trigger: 1,
        },
        EffectCommand::Explosion {
            intensity: 1000,
            effect_mode: 0,
            cct: 560,
            gm: 0,
            trigger: 0,
        },
        EffectCommand::FaultyBulb {
            intensity: 450,
            effect_mode: 1,
            cct: 320,
            gm: 50,
            speed: 11,
            trigger: 3,
        },
        EffectCommand::Pulsing {
            intensity: 330,
            effect_mode: 3,
            cct: 440,
            gm: 25,
            speed: 2,
            trigger: 1,
        },
        EffectCommand::Welding {
            intensity: 800,
            effect_mode: 1,
            cct: 600,
            gm: 75,
            min: 40,
            trigger: 2,
        },
        EffectCommand::CopCar {
            intensity: 500,
            colour: 4,
        },
        EffectCommand::Party {
            intensity: 640,
            saturation: 95,
        },
        EffectCommand::Fireworks {
            intensity: 710,
            pattern: 130,
        },
        EffectCommand::Off,
    ];

    for effect in effects {
        let command = SidusCommand::Effect(effect);
        let payload = command.encode();

        assert_eq!(payload[0], checksum(&payload));
        assert_eq!(
            SidusCommand::parse(&payload).unwrap(),
            command,
            "round trip failed for {:?}",
            effect
        );
    }
}

#[test]
fn test_checksum_mismatch_is_rejected() {
    let mut payload = SidusCommand::Cct(default_cct()).encode();
    payload[0] = payload[0].wrapping_add(1);

    assert_eq!(SidusCommand::parse(&payload), Err(SidusError::Checksum));
}

#[test]
fn test_short_payload_is_rejected() {
    let payload = SidusCommand::Cct(default_cct()).encode();
    assert_eq!(
        SidusCommand::parse(&payload[..9]),
        Err(SidusError::Truncated(9))
    );
}

#[test]
fn test_unknown_command_type_is_reported_not_guessed() {
    // Build a payload whose command-type field is unassigned (type 100)
    // but whose checksum is valid.
    let mut payload = SidusCommand::Sleep { sleep_mode: true }.encode();
    payload[9] = 0x80 | 100; // opera bit + command type 100
    payload[0] = checksum(&payload);

    assert_eq!(
        SidusCommand::parse(&payload),
        Err(SidusError::UnknownCommandType(100))
    );
}

#[test]
fn test_checksum_never_accepted_when_wrong_over_random_bodies() {
    // Derive a body from a seedless counter walk rather than an RNG so
    // the test is reproducible.
    for seed in 0u32..64 {
        let mut payload = [0u8; SIDUS_PAYLOAD_LEN];
        for (i, byte) in payload.iter_mut().enumerate().skip(1) {
            *byte = (seed.wrapping_mul(31).wrapping_add(i as u32 * 97) & 0xFF) as u8;
        }
        payload[0] = checksum(&payload);

        match SidusCommand::parse(&payload) {
            Ok(_) | Err(SidusError::UnknownCommandType(_)) | Err(SidusError::UnknownEffectType(_)) => {}
            Err(other) => panic!("valid checksum rejected with {:?}", other),
        }

        payload[0] = payload[0].wrapping_add(1);
        assert_eq!(SidusCommand::parse(&payload), Err(SidusError::Checksum));
    }
}

#[test]
fn test_vendor_payload_accepts_both_prefix_forms() {
    let payload = SidusCommand::Sleep { sleep_mode: true }.encode();

    let mut full = SIDUS_VENDOR_OPCODE.to_vec();
    full.extend_from_slice(&payload);
    assert_eq!(vendor_payload(&full).unwrap(), &payload[..]);

    let mut bare = vec![SIDUS_SUB_OPCODE];
    bare.extend_from_slice(&payload);
    assert_eq!(vendor_payload(&bare).unwrap(), &payload[..]);

    assert_eq!(
        vendor_payload(&[0x82, 0x01]),
        Err(SidusError::MissingOpcode)
    );
}

#[test]
fn test_parse_status_from_access_payload() {
    let mut access = SIDUS_VENDOR_OPCODE.to_vec();
    access.extend_from_slice(&SidusCommand::Cct(default_cct()).encode());

    let status = parse_status(&access).unwrap();
    assert_eq!(status.command_type, COMMAND_TYPE_CCT);
    assert!(status.is_on);
    assert_eq!(status.cct_kelvin, Some(4400));
}
