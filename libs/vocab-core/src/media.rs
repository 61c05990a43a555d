//! Audio file naming.

use unicode_normalization::UnicodeNormalization;

/// File name of the synthesized audio for a vowelized word.
///
/// Surrounding whitespace is dropped and the text is NFC-composed, so the
/// same word maps to the same file however the cell was padded or its
/// combining marks ordered.
pub fn audio_file_name(niqqud: &str) -> String {
    format!("{}.mp3", niqqud.trim().nfc().collect::<String>())
}
