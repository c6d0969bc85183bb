//! Hex literal parsing (`$` followed by one to four hex digits)

pub struct NumberParser;

impl NumberParser {
    /// Parse a `$XXXX` literal into a 16-bit word
    pub fn parse(s: &str) -> Result<u16, String> {
        let hex = s
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| format!("Expected a hex value (like $01FF): {}", s))?;
        Self::parse_hex(hex)
    }

    /// Parse hexadecimal digits (without prefix)
    fn parse_hex(s: &str) -> Result<u16, String> {
        if s.is_empty() || s.len() > 4 {
            return Err(format!("Hex value must have 1 to 4 digits: {}", s));
        }
        u16::from_str_radix(s, 16).map_err(|_| format!("Invalid hexadecimal: {}", s))
    }
}
