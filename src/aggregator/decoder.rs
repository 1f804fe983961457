/// Identifier and Pipsqueak payload decoding
use crate::models::INVALID_TEMPERATURE;

// Payload flag bits (byte 0)
const FLAG_EXTRA_BYTE: u8 = 0x01; // 8-bit temperature, or one leading byte before the 16-bit value
const FLAG_WIDE_TEMPERATURE: u8 = 0x02; // 16-bit temperature present

/// Temperature offset applied by both encodings (°C)
const TEMPERATURE_OFFSET: i32 = 40;

/// Values decoded from a single sample payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPayload {
    /// `None` when neither temperature encoding applies
    pub temperature: Option<f32>,
    pub on: bool,
}

/// Extract a 32-bit device or receiver id from a 16-byte identifier
///
/// Only the last four bytes are significant; they are read big-endian and
/// interpreted as a signed integer.
pub fn extract_id(raw: &[u8; 16]) -> i32 {
    i32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]])
}

/// Convert a raw 16-bit temperature reading into degrees Celsius
///
/// The first byte holds the signed high part of the whole degrees, the upper
/// nibble of the second byte the low part, and its lower nibble sixteenths of
/// a degree. Anything other than exactly two bytes yields -274.
pub fn convert_temperature(raw: Option<&[u8]>) -> f32 {
    let [high, low] = match raw {
        Some(&[high, low]) => [high, low],
        _ => return INVALID_TEMPERATURE,
    };

    let whole = (high as i8 as i32) * 16 + ((low >> 4) & 0x0F) as i32 - TEMPERATURE_OFFSET;
    let sixteenths = (low & 0x0F) as f32;

    whole as f32 + sixteenths / 16.0
}

/// Decode temperature and on/off state from a Pipsqueak payload
///
/// Payload layout:
/// - Byte 0: flags (bit 1 = 16-bit temperature, bit 0 = 8-bit temperature
///   or, together with bit 1, one byte preceding the 16-bit value)
/// - Byte 1: bit 0 = on/off; bits 1-7 = 8-bit temperature + 40
/// - Bytes 1-2 or 2-3: 16-bit temperature (see `convert_temperature`)
///
/// # Returns
/// None if the payload is shorter than two bytes
pub fn decode_payload(data: &[u8]) -> Option<DecodedPayload> {
    if data.len() < 2 {
        return None;
    }

    let flags = data[0];
    let temperature = if flags & FLAG_WIDE_TEMPERATURE != 0 && data.len() >= 3 {
        let start = if flags & FLAG_EXTRA_BYTE != 0 { 2 } else { 1 };
        // 16-bit value must fit entirely inside the payload
        data.get(start..start + 2)
            .map(|bytes| convert_temperature(Some(bytes)))
    } else if flags & FLAG_EXTRA_BYTE != 0 {
        Some((((data[1] >> 1) & 0x7F) as i32 - TEMPERATURE_OFFSET) as f32)
    } else {
        None
    };

    Some(DecodedPayload {
        temperature,
        on: data[1] & 0x01 == 0x01,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_bytes(tail: [u8; 4]) -> [u8; 16] {
        let mut raw = [0xAA; 16];
        raw[12..].copy_from_slice(&tail);
        raw
    }

    #[test]
    fn extract_id_reads_last_four_bytes_big_endian() {
        assert_eq!(extract_id(&id_bytes([0x00, 0x00, 0x04, 0xD2])), 1234);
        assert_eq!(extract_id(&id_bytes([0x12, 0x34, 0x56, 0x78])), 0x1234_5678);
    }

    #[test]
    fn extract_id_is_signed() {
        assert_eq!(extract_id(&id_bytes([0xFF, 0xFF, 0xFF, 0xFF])), -1);
        assert_eq!(extract_id(&id_bytes([0x80, 0x00, 0x00, 0x01])), i32::MIN + 1);
    }

    #[test]
    fn convert_temperature_rejects_wrong_lengths() {
        assert_eq!(convert_temperature(None), INVALID_TEMPERATURE);
        assert_eq!(convert_temperature(Some(&[])), INVALID_TEMPERATURE);
        assert_eq!(convert_temperature(Some(&[0x19])), INVALID_TEMPERATURE);
        assert_eq!(convert_temperature(Some(&[0x19, 0x03, 0x00])), INVALID_TEMPERATURE);
    }

    #[test]
    fn convert_temperature_whole_and_fraction() {
        // (0x19 * 16 + 0) - 40 = 360, 3/16 = 0.1875
        assert_eq!(convert_temperature(Some(&[0x19, 0x03])), 360.1875);
        // 4 * 16 + 1 - 40 = 25, 8/16 = 0.5
        assert_eq!(convert_temperature(Some(&[0x04, 0x18])), 25.5);
    }

    #[test]
    fn convert_temperature_high_byte_is_signed() {
        // -1 * 16 + 15 - 40 = -41
        assert_eq!(convert_temperature(Some(&[0xFF, 0xF0])), -41.0);
    }

    #[test]
    fn decode_short_payload() {
        assert_eq!(decode_payload(&[]), None);
        assert_eq!(decode_payload(&[0x01]), None);
    }

    #[test]
    fn decode_eight_bit_temperature() {
        // 0x65 >> 1 = 50, 50 - 40 = 10, low bit set
        let decoded = decode_payload(&[0x01, 0x65]).unwrap();
        assert_eq!(decoded.temperature, Some(10.0));
        assert!(decoded.on);
    }

    #[test]
    fn decode_sixteen_bit_temperature_at_offset_one() {
        let decoded = decode_payload(&[0x02, 0x04, 0x10]).unwrap();
        assert_eq!(decoded.temperature, Some(25.0));
        assert!(!decoded.on);
    }

    #[test]
    fn decode_sixteen_bit_temperature_at_offset_two() {
        let decoded = decode_payload(&[0x03, 0x01, 0x04, 0x18]).unwrap();
        assert_eq!(decoded.temperature, Some(25.5));
        assert!(decoded.on);
    }

    #[test]
    fn wide_flag_with_two_bytes_falls_back_to_eight_bit() {
        let decoded = decode_payload(&[0x03, 0x65]).unwrap();
        assert_eq!(decoded.temperature, Some(10.0));
    }

    #[test]
    fn wide_value_past_end_is_not_decoded() {
        let decoded = decode_payload(&[0x03, 0x01, 0x04]).unwrap();
        assert_eq!(decoded.temperature, None);
        assert!(decoded.on);
    }

    #[test]
    fn no_temperature_flags_still_reports_on_off() {
        let decoded = decode_payload(&[0x00, 0x01]).unwrap();
        assert_eq!(decoded.temperature, None);
        assert!(decoded.on);

        let decoded = decode_payload(&[0xAB, 0xBA]).unwrap();
        // 0xAB has bit 1 set but only two bytes: 8-bit branch, 0xBA >> 1 = 93
        assert_eq!(decoded.temperature, Some(53.0));
        assert!(!decoded.on);
    }
}
