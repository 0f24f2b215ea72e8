// SPDX-License-Identifier: MIT

use core::{fmt, ops::Deref};

use crate::fs::fat::{constant::*, format::NameCase};

/// Longest display name: 8 + '.' + 3.
pub const SHORT_NAME_MAX: usize = FAT_NAME_LEN + 1 + FAT_EXT_LEN;

/// Display form of an 8.3 name, kept inline.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    buf: [u8; SHORT_NAME_MAX],
    len: u8,
}

impl ShortName {
    /// Trailing spaces are trimmed from both fields; the dot is only
    /// emitted when the extension's first byte is not a space. Bytes outside
    /// ASCII (OEM code page characters) are shown as '?'.
    pub fn from_parts(name: &[u8; FAT_NAME_LEN], ext: &[u8; FAT_EXT_LEN]) -> Self {
        let mut buf = [0u8; SHORT_NAME_MAX];
        let mut len = 0;

        for &b in trim_padding(name) {
            buf[len] = display_byte(b);
            len += 1;
        }
        if ext[0] != b' ' {
            buf[len] = b'.';
            len += 1;
            for &b in trim_padding(ext) {
                buf[len] = display_byte(b);
                len += 1;
            }
        }

        Self { buf, len: len as u8 }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    pub fn as_str(&self) -> &str {
        // `buf` only ever holds ASCII
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl Deref for ShortName {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() honours width/alignment specs such as `{:<12}`
        f.pad(self.as_str())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[inline]
fn display_byte(b: u8) -> u8 {
    if b.is_ascii() { b } else { b'?' }
}

#[inline]
fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &field[..end]
}

/// Splits a requested name into the padded on-disk name and extension.
///
/// Copies up to 8 bytes before the first '.'. The extension is only taken
/// when that '.' directly follows the copied stem, and holds at most 3
/// bytes. Both fields are space padded.
pub fn to_short_name(name: &str, case: NameCase) -> ([u8; FAT_NAME_LEN], [u8; FAT_EXT_LEN]) {
    let mut base = [b' '; FAT_NAME_LEN];
    let mut ext = [b' '; FAT_EXT_LEN];

    let bytes = name.as_bytes();
    let stem_len = bytes
        .iter()
        .take(FAT_NAME_LEN)
        .position(|&b| b == b'.')
        .unwrap_or(bytes.len().min(FAT_NAME_LEN));
    base[..stem_len].copy_from_slice(&bytes[..stem_len]);

    if bytes.get(stem_len) == Some(&b'.') {
        let suffix = &bytes[stem_len + 1..];
        let n = suffix.len().min(FAT_EXT_LEN);
        ext[..n].copy_from_slice(&suffix[..n]);
    }

    if case == NameCase::Upper {
        base.make_ascii_uppercase();
        ext.make_ascii_uppercase();
    }
    (base, ext)
}
