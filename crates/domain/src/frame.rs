//! Body-composition scale advertisement decoder.
//!
//! Pure functions over raw service-data payloads; no BLE dependency needed.
//! The scale broadcasts service data under the 16-bit UUID `0x181B`. A raw
//! payload is the service-data AD value: the UUID prefix `1B 18` followed by
//! a 13-byte body.
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0–1 | Service UUID | `0x181B` LE |
//! | 2–3 | Flags word | u16 LE |
//! | 4–5 | Year | u16 LE |
//! | 6 | Month | u8 |
//! | 7 | Day | u8 |
//! | 8 | Hour | u8 |
//! | 9 | Minute | u8 |
//! | 10 | Second | u8 |
//! | 11–12 | Impedance | u16 LE, ohm, top bit = invalid |
//! | 13–14 | Weight | u16 LE, unit-dependent divisor |

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::address::DeviceAddress;
use crate::error::{DecodeError, MalformedFrame};
use crate::time::Timestamp;

/// Body Composition service UUID under which the scale advertises.
pub const SERVICE_UUID_181B: uuid::Uuid =
    uuid::Uuid::from_u128(0x0000_181B_0000_1000_8000_0080_5F9B_34FB);

/// 16-bit service UUID as it appears at the start of a raw payload.
pub const SERVICE_DATA_PREFIX: [u8; 2] = [0x1B, 0x18];

/// Raw payload length (prefix + body). Longer payloads are accepted and the
/// trailing bytes ignored.
pub const PAYLOAD_LEN: usize = 15;

const FLAG_POUND: u16 = 1 << 0;
const FLAG_IMPEDANCE: u16 = 1 << 9;
const FLAG_STABILIZED: u16 = 1 << 13;
const FLAG_JIN: u16 = 1 << 14;
const FLAG_WEIGHT_REMOVED: u16 = 1 << 15;

const IMPEDANCE_SIGN: u16 = 1 << 15;

const POUND_TO_KG: f64 = 0.453_592_37;
const JIN_TO_KG: f64 = 0.5;

/// One advertisement as captured by the scan collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub address: DeviceAddress,
    pub payload: Vec<u8>,
    /// Arrival order within the scan source.
    pub sequence: u64,
    pub received_at: Timestamp,
}

/// Unit the scale displays; raw weights are always converted to kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
    Jin,
}

impl WeightUnit {
    fn raw_divisor(self) -> f64 {
        match self {
            Self::Kg => 200.0,
            Self::Lb | Self::Jin => 100.0,
        }
    }

    fn kg_factor(self) -> f64 {
        match self {
            Self::Kg => 1.0,
            Self::Lb => POUND_TO_KG,
            Self::Jin => JIN_TO_KG,
        }
    }

    fn flags(self) -> u16 {
        match self {
            Self::Kg => 0,
            Self::Lb => FLAG_POUND,
            Self::Jin => FLAG_JIN,
        }
    }
}

/// Typed view of one scale advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub address: DeviceAddress,
    /// Raw flags word; unit bits are also exposed through [`Self::unit`].
    pub flags: u16,
    pub unit: WeightUnit,
    pub weight_raw: u16,
    pub impedance_raw: u16,
    /// Scale clock; `None` when the embedded date is impossible.
    pub scale_time: Option<NaiveDateTime>,
}

impl DecodedFrame {
    #[must_use]
    pub fn is_stabilized(&self) -> bool {
        self.flags & FLAG_STABILIZED != 0
    }

    #[must_use]
    pub fn has_impedance(&self) -> bool {
        self.flags & FLAG_IMPEDANCE != 0
    }

    /// The person stepped off; the weight field is stale.
    #[must_use]
    pub fn is_weight_removed(&self) -> bool {
        self.flags & FLAG_WEIGHT_REMOVED != 0
    }

    #[must_use]
    pub fn has_weight(&self) -> bool {
        self.weight_raw != 0 && !self.is_weight_removed()
    }

    /// Weight converted to kilograms whatever unit the scale displays.
    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight_raw) / self.unit.raw_divisor() * self.unit.kg_factor()
    }

    /// Whether the impedance field carries the sign/invalid bit.
    #[must_use]
    pub fn impedance_is_negative(&self) -> bool {
        self.impedance_raw & IMPEDANCE_SIGN != 0
    }

    /// Impedance in ohms, negative when the sign bit is set.
    #[must_use]
    pub fn impedance_ohm(&self) -> f64 {
        f64::from(i16::from_le_bytes(self.impedance_raw.to_le_bytes()))
    }

    /// Re-encode into a raw payload (used to replay captured readings).
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let flags = (self.flags & !(FLAG_POUND | FLAG_JIN)) | self.unit.flags();
        let mut out = Vec::with_capacity(PAYLOAD_LEN);
        out.extend_from_slice(&SERVICE_DATA_PREFIX);
        out.extend_from_slice(&flags.to_le_bytes());
        match self.scale_time {
            Some(time) => {
                let year = u16::try_from(time.year()).unwrap_or_default();
                out.extend_from_slice(&year.to_le_bytes());
                for part in [
                    time.month(),
                    time.day(),
                    time.hour(),
                    time.minute(),
                    time.second(),
                ] {
                    out.push(u8::try_from(part).unwrap_or_default());
                }
            }
            None => out.extend_from_slice(&[0; 7]),
        }
        out.extend_from_slice(&self.impedance_raw.to_le_bytes());
        out.extend_from_slice(&self.weight_raw.to_le_bytes());
        out
    }
}

/// Decode a raw frame captured from `expected`.
///
/// # Errors
///
/// Returns [`DecodeError::WrongDevice`] when the frame was sent by another
/// device, and [`DecodeError::MalformedFrame`] when the payload does not carry
/// the `0x181B` prefix or is too short.
pub fn decode(raw: &RawFrame, expected: DeviceAddress) -> Result<DecodedFrame, DecodeError> {
    if raw.address != expected {
        return Err(DecodeError::WrongDevice {
            expected,
            actual: raw.address,
        });
    }
    Ok(decode_payload(raw.address, &raw.payload)?)
}

/// Decode a payload without any address filtering.
///
/// # Errors
///
/// Returns [`MalformedFrame`] when the prefix does not match or the payload
/// is shorter than [`PAYLOAD_LEN`].
pub fn decode_payload(
    address: DeviceAddress,
    payload: &[u8],
) -> Result<DecodedFrame, MalformedFrame> {
    if payload.len() < PAYLOAD_LEN {
        return Err(MalformedFrame::TooShort {
            minimum: PAYLOAD_LEN,
            actual: payload.len(),
        });
    }
    let prefix = [payload[0], payload[1]];
    if prefix != SERVICE_DATA_PREFIX {
        return Err(MalformedFrame::BadSignature { found: prefix });
    }

    let body = &payload[2..PAYLOAD_LEN];
    let flags = u16::from_le_bytes([body[0], body[1]]);
    let unit = if flags & FLAG_POUND != 0 {
        WeightUnit::Lb
    } else if flags & FLAG_JIN != 0 {
        WeightUnit::Jin
    } else {
        WeightUnit::Kg
    };

    let year = u16::from_le_bytes([body[2], body[3]]);
    let scale_time = NaiveDate::from_ymd_opt(
        i32::from(year),
        u32::from(body[4]),
        u32::from(body[5]),
    )
    .and_then(|date| {
        date.and_hms_opt(u32::from(body[6]), u32::from(body[7]), u32::from(body[8]))
    });

    Ok(DecodedFrame {
        address,
        flags,
        unit,
        impedance_raw: u16::from_le_bytes([body[9], body[10]]),
        weight_raw: u16::from_le_bytes([body[11], body[12]]),
        scale_time,
    })
}

/// Flag helpers for building frames by hand.
pub mod flags {
    pub const IMPEDANCE: u16 = super::FLAG_IMPEDANCE;
    pub const STABILIZED: u16 = super::FLAG_STABILIZED;
    pub const WEIGHT_REMOVED: u16 = super::FLAG_WEIGHT_REMOVED;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: DeviceAddress = DeviceAddress::new([0x88, 0x22, 0xB2, 0xA7, 0xCE, 0xB6]);

    fn raw(payload: Vec<u8>) -> RawFrame {
        RawFrame {
            address: SCALE,
            payload,
            sequence: 0,
            received_at: crate::time::now(),
        }
    }

    #[test]
    fn should_decode_stabilized_frame_with_impedance() {
        // flags 0x2202, 2024-03-05 07:30:15, impedance 520, weight 14480 (72.4 kg)
        let payload = vec![
            0x1B, 0x18, // service UUID
            0x02, 0x22, // flags: impedance + stabilized
            0xE8, 0x07, // year 2024
            0x03, 0x05, // month, day
            0x07, 0x1E, 0x0F, // 07:30:15
            0x08, 0x02, // impedance 520
            0x90, 0x38, // weight 14480
        ];

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert!(frame.is_stabilized());
        assert!(frame.has_impedance());
        assert!(frame.has_weight());
        assert_eq!(frame.unit, WeightUnit::Kg);
        assert_eq!(frame.impedance_raw, 520);
        assert!((frame.impedance_ohm() - 520.0).abs() < f64::EPSILON);
        assert!((frame.weight_kg() - 72.4).abs() < 1e-9);
        assert_eq!(
            frame.scale_time,
            NaiveDate::from_ymd_opt(2024, 3, 5).and_then(|d| d.and_hms_opt(7, 30, 15))
        );
    }

    #[test]
    fn should_convert_pounds_to_kilograms() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&SERVICE_DATA_PREFIX);
        payload[2] = 0x01; // pound unit
        payload[13..15].copy_from_slice(&15_960u16.to_le_bytes()); // 159.60 lb

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert_eq!(frame.unit, WeightUnit::Lb);
        assert!((frame.weight_kg() - 159.6 * 0.453_592_37).abs() < 1e-9);
    }

    #[test]
    fn should_convert_jin_to_kilograms() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&SERVICE_DATA_PREFIX);
        payload[3] = 0x40; // jin unit
        payload[13..15].copy_from_slice(&14_480u16.to_le_bytes()); // 144.80 jin

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert_eq!(frame.unit, WeightUnit::Jin);
        assert!((frame.weight_kg() - 72.4).abs() < 1e-9);
    }

    #[test]
    fn should_report_negative_impedance_when_sign_bit_set() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&SERVICE_DATA_PREFIX);
        payload[11..13].copy_from_slice(&0xFFFEu16.to_le_bytes());

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert!(frame.impedance_is_negative());
        assert!((frame.impedance_ohm() - (-2.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn should_leave_scale_time_empty_when_date_is_impossible() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&SERVICE_DATA_PREFIX);
        payload[6] = 13; // month 13

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert!(frame.scale_time.is_none());
    }

    #[test]
    fn should_treat_removed_weight_as_absent() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&SERVICE_DATA_PREFIX);
        payload[3] = 0x80; // weight removed
        payload[13..15].copy_from_slice(&14_480u16.to_le_bytes());

        let frame = decode(&raw(payload), SCALE).unwrap();
        assert!(frame.is_weight_removed());
        assert!(!frame.has_weight());
    }

    #[test]
    fn should_reject_short_payload() {
        let err = decode(&raw(vec![0x1B, 0x18, 0x00]), SCALE).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedFrame(MalformedFrame::TooShort {
                minimum: PAYLOAD_LEN,
                actual: 3,
            })
        );
    }

    #[test]
    fn should_ignore_trailing_bytes_after_payload() {
        let frame = DecodedFrame {
            address: SCALE,
            flags: flags::STABILIZED | flags::IMPEDANCE,
            unit: WeightUnit::Kg,
            weight_raw: 14_480,
            impedance_raw: 520,
            scale_time: None,
        };
        let mut payload = frame.to_payload();
        payload.extend_from_slice(&[0xFF, 0xFF, 0x7F]);

        let decoded = decode(&raw(payload), SCALE).unwrap();

        assert_eq!(decoded.weight_raw, 14_480);
        assert_eq!(decoded.impedance_raw, 520);
        assert!(decoded.is_stabilized());
        assert!(decoded.has_impedance());
    }

    #[test]
    fn should_reject_foreign_service_prefix() {
        let mut payload = vec![0u8; PAYLOAD_LEN];
        payload[0] = 0x1A;
        payload[1] = 0x18;
        let err = decode(&raw(payload), SCALE).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedFrame(MalformedFrame::BadSignature { found: [0x1A, 0x18] })
        ));
    }

    #[test]
    fn should_filter_frames_from_other_devices() {
        let other = DeviceAddress::new([0xA4, 0xC1, 0x38, 0x5B, 0x0E, 0xDF]);
        let mut frame = raw(vec![0u8; PAYLOAD_LEN]);
        frame.address = other;
        let err = decode(&frame, SCALE).unwrap_err();
        assert_eq!(
            err,
            DecodeError::WrongDevice {
                expected: SCALE,
                actual: other,
            }
        );
    }

    #[test]
    fn should_reencode_to_identical_payload() {
        let frame = DecodedFrame {
            address: SCALE,
            flags: flags::STABILIZED | flags::IMPEDANCE,
            unit: WeightUnit::Lb,
            weight_raw: 15_960,
            impedance_raw: 480,
            scale_time: NaiveDate::from_ymd_opt(2025, 1, 31).and_then(|d| d.and_hms_opt(23, 59, 0)),
        };
        let payload = frame.to_payload();
        assert_eq!(payload.len(), PAYLOAD_LEN);

        let decoded = decode_payload(SCALE, &payload).unwrap();
        assert_eq!(decoded.unit, WeightUnit::Lb);
        assert_eq!(decoded.weight_raw, 15_960);
        assert_eq!(decoded.impedance_raw, 480);
        assert_eq!(decoded.scale_time, frame.scale_time);
        assert!(decoded.is_stabilized());
    }
}
