use crate::error::{Result, SignatureError};

/// Render a color as an uppercase `#RRGGBB` string.
pub fn rgb_to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Render arbitrary integer channels as `#RRGGBB`, rejecting any channel outside `0..=255` instead of truncating it.
pub fn try_rgb_to_hex(channels: [i64; 3]) -> Result<String> {
    rgb_from_channels(channels).map(rgb_to_hex)
}

/// Validate integer channels into an RGB triple.
pub fn rgb_from_channels([r, g, b]: [i64; 3]) -> Result<(u8, u8, u8)> {
    Ok((channel("red", r)?, channel("green", g)?, channel("blue", b)?))
}

fn channel(name: &'static str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| SignatureError::InvalidChannelValue { channel: name, value })
}

/// Parse a `#RRGGBB` string back into its channels. Hex digits may be either case.
pub fn hex_to_rgb(hex: &str) -> Result<(u8, u8, u8)> {
    let invalid = || SignatureError::InvalidHex { value: hex.to_string() };

    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).map_err(|_| invalid());
    Ok((parse(0..2)?, parse(2..4)?, parse(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_zero_padded_uppercase() {
        assert_eq!(rgb_to_hex((255, 0, 10)), "#FF000A");
        assert_eq!(rgb_to_hex((0, 0, 0)), "#000000");
        assert_eq!(rgb_to_hex((171, 205, 239)), "#ABCDEF");
    }

    #[test]
    fn channels_round_trip() {
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(17) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    let color = (r as u8, g as u8, b);
                    assert_eq!(hex_to_rgb(&rgb_to_hex(color)).unwrap(), color);
                }
            }
        }
    }

    #[test]
    fn strings_round_trip() {
        for hex in ["#000000", "#FFFFFF", "#0A0B0C", "#7F80FE", "#C0FFEE"] {
            assert_eq!(rgb_to_hex(hex_to_rgb(hex).unwrap()), hex);
        }
    }

    #[test]
    fn lowercase_digits_are_accepted() {
        assert_eq!(hex_to_rgb("#c0ffee").unwrap(), (0xC0, 0xFF, 0xEE));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        for hex in ["", "#", "C0FFEE", "#C0FFE", "#C0FFEE0", "#G0FFEE", "#+0FFEE", "#C0FFÉ"] {
            assert!(
                matches!(hex_to_rgb(hex), Err(SignatureError::InvalidHex { .. })),
                "{hex:?} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_range_channels_are_rejected() {
        assert_eq!(try_rgb_to_hex([12, 34, 255]).unwrap(), "#0C22FF");
        assert!(matches!(
            try_rgb_to_hex([256, 0, 0]),
            Err(SignatureError::InvalidChannelValue {
                channel: "red",
                value: 256
            })
        ));
        assert!(matches!(
            try_rgb_to_hex([0, 0, -1]),
            Err(SignatureError::InvalidChannelValue { channel: "blue", .. })
        ));
    }
}
