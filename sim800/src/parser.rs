//! Field extraction for the structured SIM800 response lines.
//!
//! All parsers take one line with the transport framing already removed
//! (trailing `\r`/`\n` are tolerated) and return `None` if the line does not
//! have the expected shape.

use nom::{
    bytes::complete::tag,
    character::complete::{space0, u32 as decimal},
    combinator::recognize,
    sequence::{preceded, tuple},
    IResult,
};

use crate::helpers::{SliceExt, LINE_TERM_CHARS};
use crate::responses::{BatteryStatus, SignalQuality};

/// Identity values shorter than this are stray fragments, not payload.
pub const MIN_IDENTITY_LEN: usize = 3;

/// Matches a response prefix including the colon and any following
/// spaces. Eg `+CSQ: `
fn prefix<'a>(name: &'static str) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], &'a [u8]> {
    move |i| recognize(tuple((tag(name), tag(":"), space0)))(i)
}

/// A decimal field, with optional leading spaces.
fn field(i: &[u8]) -> IResult<&[u8], u32> {
    preceded(space0, decimal)(i)
}

fn comma(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(space0, tag(","))(i)
}

/// `+CSQ: <rssi>,<ber>`
pub fn signal_quality(line: &[u8]) -> Option<SignalQuality> {
    let (_, (rssi, _, ber)) =
        preceded(prefix("+CSQ"), tuple((field, comma, field)))(line).ok()?;
    Some(SignalQuality { rssi, ber })
}

/// `+CBC: <bcs>,<bcl>,<voltage>`
pub fn battery_status(line: &[u8]) -> Option<BatteryStatus> {
    let (_, (bcs, _, bcl, _, voltage)) = preceded(
        prefix("+CBC"),
        tuple((field, comma, field, comma, field)),
    )(line)
    .ok()?;
    Some(BatteryStatus { bcs, bcl, voltage })
}

/// `+COPS: <mode>[,<format>[,<oper>]]`
///
/// The operator name may contain spaces, so the line is split on commas
/// only, into at most three parts. The name is only present when all
/// three parts are.
pub fn operator_name(line: &[u8]) -> Option<&[u8]> {
    let (rest, _) = prefix("+COPS")(line).ok()?;

    let mut parts = rest.splitn(3, |c| *c == b',');
    let (_mode, _format, name) = (parts.next()?, parts.next()?, parts.next()?);

    let name = unquote(name.trim_end(LINE_TERM_CHARS));
    (!name.is_empty()).then_some(name)
}

/// The whole line is the value, eg. the IMEI returned by `AT+CGSN`.
pub fn identity_value(line: &[u8]) -> Option<&[u8]> {
    let value = line.trim_end(LINE_TERM_CHARS);
    (value.len() >= MIN_IDENTITY_LEN).then_some(value)
}

fn unquote(value: &[u8]) -> &[u8] {
    match value {
        [b'"', inner @ .., b'"'] => inner,
        _ => value,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn csq() {
        assert_eq!(
            signal_quality(b"+CSQ: 10,29"),
            Some(SignalQuality { rssi: 10, ber: 29 })
        );
        assert_eq!(
            signal_quality(b"+CSQ:99, 99\r\n"),
            Some(SignalQuality { rssi: 99, ber: 99 })
        );
    }

    #[test]
    fn csq_malformed() {
        assert_eq!(signal_quality(b"+CSQ: ,29"), None);
        assert_eq!(signal_quality(b"+CSQ: 10"), None);
        assert_eq!(signal_quality(b"+CSQ: ab,cd"), None);
        assert_eq!(signal_quality(b"+CBC: 10,29"), None);
        assert_eq!(signal_quality(b"AT+CSQ"), None);
    }

    #[test]
    fn cbc() {
        assert_eq!(
            battery_status(b"+CBC: 1,80,4150"),
            Some(BatteryStatus {
                bcs: 1,
                bcl: 80,
                voltage: 4150
            })
        );
        assert_eq!(battery_status(b"+CBC: 1,80"), None);
    }

    #[test]
    fn cops_keeps_spaces() {
        assert_eq!(
            operator_name(b"+COPS: 0,0,Operator One"),
            Some(&b"Operator One"[..])
        );
        assert_eq!(
            operator_name(b"+COPS: 0,0,\"Operator One\"\r\n"),
            Some(&b"Operator One"[..])
        );
    }

    #[test]
    fn cops_name_may_contain_commas() {
        assert_eq!(
            operator_name(b"+COPS: 0,0,\"Acme, Inc.\""),
            Some(&b"Acme, Inc."[..])
        );
    }

    #[test]
    fn cops_insufficient_fields() {
        assert_eq!(operator_name(b"+COPS: 0"), None);
        assert_eq!(operator_name(b"+COPS: 0,0"), None);
        assert_eq!(operator_name(b"+COPS: 0,0,"), None);
        assert_eq!(operator_name(b"+COPS?"), None);
    }

    #[test]
    fn identity() {
        assert_eq!(
            identity_value(b"861234567890123\r\n"),
            Some(&b"861234567890123"[..])
        );
        assert_eq!(identity_value(b"SIMCOM_SIM800L"), Some(&b"SIMCOM_SIM800L"[..]));
        assert_eq!(identity_value(b"ab\r\n"), None);
        assert_eq!(identity_value(b"\r\n"), None);
        assert_eq!(identity_value(b""), None);
    }
}
