use crate::error::Result;

/// Splits a `MULTI_SZ` buffer (NUL separated, double-NUL terminated UTF-16)
/// into owned strings. Empty entries are skipped.
pub fn parse_multi_sz(buf: &[u16]) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    for slice in buf.split(|x| *x == 0) {
        if slice.is_empty() {
            continue;
        }
        strings.push(String::from_utf16(slice)?);
    }
    Ok(strings)
}

/// NUL-terminated UTF-16 copy of `s`, suitable for a `PCWSTR`.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_sz(strings: &[&str]) -> Vec<u16> {
        let mut buf = Vec::new();
        for s in strings {
            buf.extend(s.encode_utf16());
            buf.push(0);
        }
        buf.push(0);
        buf
    }

    #[test]
    fn splits_two_strings() {
        let buf = multi_sz(&[r"\Processor(0)\% Idle Time", r"\Processor(1)\% Idle Time"]);
        assert_eq!(
            parse_multi_sz(&buf).unwrap(),
            vec![r"\Processor(0)\% Idle Time", r"\Processor(1)\% Idle Time"]
        );
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_multi_sz(&[0, 0]).unwrap().is_empty());
        assert!(parse_multi_sz(&[]).unwrap().is_empty());
    }

    #[test]
    fn trailing_slack_is_ignored() {
        // PDH may report a length larger than what it wrote.
        let mut buf = multi_sz(&["a", "b"]);
        buf.extend([0, 0, 0, 0]);
        assert_eq!(parse_multi_sz(&buf).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn missing_terminator_still_yields_last_string() {
        let buf: Vec<u16> = "abc".encode_utf16().collect();
        assert_eq!(parse_multi_sz(&buf).unwrap(), vec!["abc"]);
    }

    #[test]
    fn invalid_utf16_is_an_error() {
        // Lone high surrogate.
        let buf = [0xD800, 0, 0];
        assert!(parse_multi_sz(&buf).is_err());
    }

    #[test]
    fn wide_is_nul_terminated() {
        let wide = to_wide("% Idle Time");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(wide.len(), "% Idle Time".len() + 1);
        assert_eq!(to_wide(""), vec![0]);
    }
}
