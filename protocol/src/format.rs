use core::fmt;

/// Displays bytes as upper case hex, each byte followed by a single space.
///
/// `[0x80, 0x00, 0x00, 0xA0, 0x41]` is shown as `"80 00 00 A0 41 "`, including the trailing
/// space.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02X} ")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
pub fn format_hex(bytes: &[u8]) -> String {
    HexBytes(bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_degrees() {
        assert_eq!(
            format_hex(&[0x80, 0x00, 0x00, 0xA0, 0x41]),
            "80 00 00 A0 41 "
        );
    }

    #[test]
    fn empty() {
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn single_byte_keeps_trailing_space() {
        assert_eq!(format_hex(&[0x0F]), "0F ");
    }

    #[test]
    fn display_into_fixed_buffer() {
        use core::fmt::Write;

        let mut s = heapless::String::<16>::new();
        write!(s, "{}", HexBytes(&[0xDE, 0xAD])).unwrap();
        assert_eq!(s.as_str(), "DE AD ");
    }
}
