// Memory channel contents as read and written with the MT command.
//
// Answer layout, 0 based character positions:
//   0..2   "MT"
//   2..5   memory location
//   5..14  VFO-A frequency in Hz
//   14..19 clarifier offset, signed, e.g. "+0000"
//   19     rx clarifier        20  tx clarifier
//   21     mode                22  "0"
//   23     tone/DCS encoding   24..26 "00"
//   26     repeater shift      27  "0"
//   28..40 tag, blank padded   40  ";"

use super::tables::{CLARIFIER, ENCODE, MODE, SHIFT};
use super::CatError;
use std::ops::RangeInclusive;

pub const LOCATIONS: RangeInclusive<u16> = 1..=118;
pub const FREQUENCIES: RangeInclusive<u64> = 30_000..=450_000_000;
pub const MAX_CLARIFIER: i32 = 9999;
pub const MAX_TAG: usize = 12;

const ANSWER_LEN: usize = 41;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryChannel {
    pub location: u16,
    pub rx_freq: u64, // Hz
    pub clarifier: i32, // offset in Hz
    pub rx_clarifier: bool,
    pub tx_clarifier: bool,
    pub mode: String,
    pub encode: String,
    pub shift: String,
    pub tag: String,
}

fn invalid(msg: &str) -> CatError {
    CatError::Invalid(msg.into())
}

pub fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

pub fn parse_on_off(text: &str) -> Result<bool, CatError> {
    Ok(CLARIFIER.code(text)? == "1")
}

impl MemoryChannel {
    pub fn validate(&self) -> Result<(), CatError> {
        if !LOCATIONS.contains(&self.location) {
            return Err(invalid("Memory location must be between 1 and 118, inclusive."));
        }
        if !FREQUENCIES.contains(&self.rx_freq) {
            return Err(invalid(
                "VFO-A frequency must be between 30 kHz and 450 MHz, inclusive.",
            ));
        }
        if self.clarifier.abs() > MAX_CLARIFIER {
            return Err(invalid(
                "Clarifier frequency must be between -9999 Hz and +9999 Hz, inclusive.",
            ));
        }
        if !self.tag.is_ascii() || self.tag.len() > MAX_TAG {
            return Err(invalid("Memory tags must be twelve ASCII characters or less."));
        }
        Ok(())
    }

    /// The MT write command for this channel.
    pub fn encode(&self) -> Result<String, CatError> {
        self.validate()?;
        Ok(format!(
            "MT{:03}{:09}{:+05}{}{}{}0{}00{}0{:<12};",
            self.location,
            self.rx_freq,
            self.clarifier,
            CLARIFIER.code(on_off(self.rx_clarifier))?,
            CLARIFIER.code(on_off(self.tx_clarifier))?,
            MODE.code(&self.mode)?,
            ENCODE.code(&self.encode)?,
            SHIFT.code(&self.shift)?,
            self.tag,
        ))
    }

    /// Decodes the answer to an `MTnnn;` read command.
    pub fn decode(answer: &str) -> Result<Self, CatError> {
        let bad = || CatError::Answer {
            command: "MT".into(),
            answer: answer.into(),
        };
        if answer.len() < ANSWER_LEN || !answer.is_ascii() || !answer.starts_with("MT") {
            return Err(bad());
        }
        let field = |from: usize, to: usize| &answer[from..to];
        Ok(Self {
            location: field(2, 5).parse().map_err(|_| bad())?,
            rx_freq: field(5, 14).parse().map_err(|_| bad())?,
            clarifier: field(14, 19).parse().map_err(|_| bad())?,
            rx_clarifier: CLARIFIER.text(field(19, 20))? == "ON",
            tx_clarifier: CLARIFIER.text(field(20, 21))? == "ON",
            mode: MODE.text(field(21, 22))?.into(),
            encode: ENCODE.text(field(23, 24))?.into(),
            shift: SHIFT.text(field(26, 27))?.into(),
            tag: field(28, 40).trim().into(),
        })
    }
}

/// "146.52" to 146520000 Hz. Digits past the Hz are dropped.
pub fn parse_mhz(text: &str) -> Result<u64, CatError> {
    let text = text.trim();
    let bad = || CatError::Invalid(format!("invalid frequency '{text}'"));
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return Err(bad());
    }
    let mhz: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| bad())?
    };
    let mut hz: u64 = 0;
    for (i, b) in fraction.bytes().take(6).enumerate() {
        hz += u64::from(b - b'0') * 10u64.pow(5 - i as u32);
    }
    mhz.checked_mul(1_000_000)
        .and_then(|v| v.checked_add(hz))
        .ok_or_else(bad)
}

/// 146520000 Hz to "146.52"
pub fn format_mhz(hz: u64) -> String {
    let fraction = format!("{:06}", hz % 1_000_000);
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };
    format!("{}.{}", hz / 1_000_000, fraction)
}
