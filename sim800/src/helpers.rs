use heapless::String;

/// Line termination (S3) and response formatting (S4) characters.
pub(crate) const LINE_TERM_CHARS: &[u8] = &[b'\r', b'\n'];

pub(crate) trait SliceExt {
    fn trim_end(&self, whitespaces: &[u8]) -> &Self;
}

impl SliceExt for [u8] {
    fn trim_end(&self, whitespaces: &[u8]) -> &[u8] {
        let is_not_whitespace = |c| !whitespaces.contains(c);
        self.iter()
            .rposition(is_not_whitespace)
            .map_or(&[], |last| &self[..=last])
    }
}

/// Returns `true` if `needle` occurs anywhere in `haystack`.
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

/// Replace the contents of `dst` with `src`, stopping at the capacity of
/// `dst` rather than overflowing it. Invalid UTF-8 is replaced.
pub(crate) fn copy_truncated<const N: usize>(dst: &mut String<N>, src: &[u8]) {
    dst.clear();
    for chunk in src.utf8_chunks() {
        for c in chunk.valid().chars() {
            if dst.push(c).is_err() {
                return;
            }
        }
        if !chunk.invalid().is_empty() && dst.push(char::REPLACEMENT_CHARACTER).is_err() {
            return;
        }
    }
}

pub struct LossyStr<'a>(pub &'a [u8]);

impl core::fmt::Debug for LossyStr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LossyStr<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match core::str::from_utf8(self.0) {
            Ok(s) => defmt::write!(fmt, "{:?}", s),
            Err(_) => defmt::write!(fmt, "{:?}", self.0),
        }
    }
}
