//! Simulator radio registers
//!
//! Simulators expose COM frequencies as a 16-bit BCD word holding the four
//! digits after the implied leading `1`: `0x1830` is 118.30 MHz. The radio
//! switch panel is a bit field with one receive bit per COM radio.

use simcom_core::{ComSelector, Frequency};

/// Radio switch bit: receiving on COM1
pub const RADIO_SWITCH_COM1: u8 = 0x80;

/// Radio switch bit: receiving on COM2
pub const RADIO_SWITCH_COM2: u8 = 0x40;

/// Decode a COM frequency register
///
/// Returns `None` when any nibble is not a decimal digit.
pub fn decode_com_bcd(raw: u16) -> Option<Frequency> {
    let mut hundredths = 10_000u32;
    let mut scale = 1u32;
    let mut word = raw;
    for _ in 0..4 {
        let digit = u32::from(word & 0x0F);
        if digit > 9 {
            return None;
        }
        hundredths += digit * scale;
        scale *= 10;
        word >>= 4;
    }
    Some(Frequency::from_hundredths(hundredths))
}

/// Encode a frequency into a COM register
///
/// Only 100.00 to 199.99 fit the implied leading `1`.
pub fn encode_com_bcd(frequency: Frequency) -> Option<u16> {
    let hundredths = frequency.hundredths();
    if !(10_000..20_000).contains(&hundredths) {
        return None;
    }

    let mut rest = hundredths - 10_000;
    let mut raw = 0u16;
    for shift in [0u16, 4, 8, 12] {
        raw |= ((rest % 10) as u16) << shift;
        rest /= 10;
    }
    Some(raw)
}

/// Decode the radio switch panel into a selector
pub fn decode_radio_switch(raw: u8) -> ComSelector {
    match (raw & RADIO_SWITCH_COM1 != 0, raw & RADIO_SWITCH_COM2 != 0) {
        (true, true) => ComSelector::Both,
        (true, false) => ComSelector::Com1,
        (false, true) => ComSelector::Com2,
        (false, false) => ComSelector::None,
    }
}

/// Encode a selector into radio switch bits
pub fn encode_radio_switch(selector: ComSelector) -> u8 {
    match selector {
        ComSelector::None => 0,
        ComSelector::Com1 => RADIO_SWITCH_COM1,
        ComSelector::Com2 => RADIO_SWITCH_COM2,
        ComSelector::Both => RADIO_SWITCH_COM1 | RADIO_SWITCH_COM2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_com_register() {
        assert_eq!(decode_com_bcd(0x1830), Some(Frequency::from_hundredths(11830)));
        assert_eq!(decode_com_bcd(0x2190), Some(Frequency::from_hundredths(12190)));
        assert_eq!(decode_com_bcd(0x3697), Some(Frequency::from_hundredths(13697)));
        assert_eq!(decode_com_bcd(0x0000), Some(Frequency::from_hundredths(10000)));
    }

    #[test]
    fn test_decode_rejects_non_decimal_nibbles() {
        assert_eq!(decode_com_bcd(0x18A0), None);
        assert_eq!(decode_com_bcd(0xF830), None);
    }

    #[test]
    fn test_encode_com_register() {
        let f: Frequency = "122.80".parse().unwrap();
        assert_eq!(encode_com_bcd(f), Some(0x2280));
        assert_eq!(encode_com_bcd(Frequency::from_hundredths(9_999)), None);
        assert_eq!(encode_com_bcd(Frequency::from_hundredths(20_000)), None);
    }

    #[test]
    fn test_radio_switch_bits() {
        assert_eq!(decode_radio_switch(0x80), ComSelector::Com1);
        assert_eq!(decode_radio_switch(0x40), ComSelector::Com2);
        assert_eq!(decode_radio_switch(0xC8), ComSelector::Both);
        assert_eq!(decode_radio_switch(0x08), ComSelector::None);
        assert_eq!(
            decode_radio_switch(encode_radio_switch(ComSelector::Com2)),
            ComSelector::Com2
        );
    }
}
