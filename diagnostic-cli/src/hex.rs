use std::str::FromStr;

/// Bytes given on the command line as hex.
///
/// Digits may be contiguous or separated by spaces, colons or dashes, so both `8000 00A041` and
/// the `80 00 00 A0 41 ` form printed by this tool are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HexArg(pub(crate) Vec<u8>);

impl FromStr for HexArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
            .collect::<Vec<_>>();

        if digits.len() % 2 != 0 {
            return Err(format!("odd number of hex digits ({})", digits.len()));
        }

        digits
            .chunks(2)
            .map(|pair| {
                let text = pair.iter().collect::<String>();
                u8::from_str_radix(&text, 16).map_err(|_| format!("invalid hex byte \"{text}\""))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(HexArg)
    }
}

impl std::ops::Deref for HexArg {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Parse an integer that may be given in decimal or with a `0x` prefix.
pub(crate) fn parse_u16(s: &str) -> Result<u16, String> {
    let result = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    result.map_err(|e| format!("{e}"))
}
