//! Backslash escapes in messages typed on the command line

use libskypost::{Result, SkypostError};

/// Interpret backslash escapes in `input`
///
/// Supported: `\n \t \r \a \b \f \v \\ \" \'`, `\xHH` and three-digit octal
/// `\OOO` bytes, and `\uXXXX` / `\UXXXXXXXX` code points. Byte escapes may
/// spell out UTF-8 sequences (`\xc3\xa9` is `é`); the result must be valid
/// UTF-8. Any other escape, or a lone trailing backslash, is rejected.
pub fn unescape(input: &str) -> Result<String> {
    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('a') => out.push(0x07),
            Some('b') => out.push(0x08),
            Some('f') => out.push(0x0c),
            Some('v') => out.push(0x0b),
            Some('\\') => out.push(b'\\'),
            Some('"') => out.push(b'"'),
            Some('\'') => out.push(b'\''),
            Some('x') => {
                let value = read_digits(&mut chars, 2, 16, 'x')?;
                out.push(value as u8);
            }
            Some(first @ '0'..='7') => {
                let rest = read_digits(&mut chars, 2, 8, first)?;
                let value = (first as u32 - '0' as u32) * 64 + rest;
                if value > 0xff {
                    return Err(invalid(format!("Octal escape '\\{}' is out of range", first)));
                }
                out.push(value as u8);
            }
            Some(kind @ ('u' | 'U')) => {
                let width = if kind == 'u' { 4 } else { 8 };
                let value = read_digits(&mut chars, width, 16, kind)?;
                let decoded = char::from_u32(value).ok_or_else(|| {
                    invalid(format!(
                        "Escape '\\{}{:0width$x}' is not a valid Unicode code point",
                        kind,
                        value,
                        width = width
                    ))
                })?;
                push_char(&mut out, decoded);
            }
            Some(other) => {
                return Err(invalid(format!(
                    "Unsupported escape sequence '\\{}' in message",
                    other
                )))
            }
            None => return Err(invalid("Message ends with a lone backslash".to_string())),
        }
    }

    String::from_utf8(out)
        .map_err(|_| invalid("Byte escapes in message do not form valid UTF-8".to_string()))
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0_u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Read exactly `count` digits in `radix`
fn read_digits(
    chars: &mut std::str::Chars<'_>,
    count: usize,
    radix: u32,
    kind: char,
) -> Result<u32> {
    let mut value = 0_u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(radix))
            .ok_or_else(|| invalid(format!("Escape '\\{}' needs {} digits", kind, count)))?;
        value = value * radix + digit;
    }
    Ok(value)
}

fn invalid(message: String) -> SkypostError {
    SkypostError::InvalidInput(message)
}
