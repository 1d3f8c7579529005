//! # Note Annotation Module
//!
//! Maps frequencies onto the equal-tempered scale (A4 = 440 Hz) so that
//! consumers can label an estimate with a note name and a cent offset.

use once_cell::sync::Lazy;

/// A note of the equal-tempered scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name with octave, e.g. "A4" or "C#3"
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI range 12 (C0) to 119 (B8).
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    (12..120)
        .map(|midi: i32| {
            let frequency = 440.0 * 2.0_f32.powf((midi - 69) as f32 / 12.0);
            let name = format!("{}{}", NOTE_NAMES[(midi % 12) as usize], midi / 12 - 1);
            Note { name, frequency }
        })
        .collect()
});

/// Finds the closest note to `freq`, or `None` for non-positive or non-finite input.
pub fn find_nearest_note(freq: f32) -> Option<&'static Note> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    NOTES.iter().min_by(|a, b| {
        let diff_a = (a.frequency.log2() - freq.log2()).abs();
        let diff_b = (b.frequency.log2() - freq.log2()).abs();
        diff_a.total_cmp(&diff_b)
    })
}

/// Deviation of `freq` from `target_freq` in cents (positive = sharp).
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Formats `freq` as "440.0 Hz (A4 +0.0 cents)".
pub fn describe(freq: f32) -> String {
    match find_nearest_note(freq) {
        Some(note) => format!(
            "{:.1} Hz ({} {:+.1} cents)",
            freq,
            note.name,
            calculate_cents_deviation(freq, note.frequency)
        ),
        None => format!("{:.1} Hz", freq),
    }
}
