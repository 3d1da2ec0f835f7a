// Human readable transceiver settings and their CAT parameter values

use super::CatError;

/// A two way mapping between setting names and CAT codes.
#[derive(Debug)]
pub struct Table {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn code(&self, text: &str) -> Result<&'static str, CatError> {
        let text = text.trim();
        self.entries
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(text))
            .map(|(_, c)| *c)
            .ok_or_else(|| CatError::Invalid(format!("invalid {} '{}'", self.name, text)))
    }

    pub fn text(&self, code: &str) -> Result<&'static str, CatError> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(t, _)| *t)
            .ok_or_else(|| CatError::Invalid(format!("unknown {} code '{}'", self.name, code)))
    }
}

pub const MODE: Table = Table {
    name: "mode",
    entries: &[
        ("LSB", "1"),
        ("USB", "2"),
        ("CW", "3"),
        ("FM", "4"),
        ("AM", "5"),
        ("RTTY-LSB", "6"),
        ("CW-R", "7"),
        ("DATA-LSB", "8"),
        ("RTTY-USB", "9"),
        ("DATA-FM", "A"),
        ("FM-N", "B"),
        ("DATA-USB", "C"),
        ("AM-N", "D"),
        ("C4FM", "E"),
    ],
};

pub const SHIFT: Table = Table {
    name: "repeater shift",
    entries: &[("OFF", "0"), ("+RPT", "1"), ("-RPT", "2")],
};

pub const ENCODE: Table = Table {
    name: "encoding",
    entries: &[
        ("OFF", "0"),
        ("ENC/DEC", "1"),
        ("TONE ENC", "2"),
        ("DCS", "3"),
        ("DCS ENC/DEC", "4"),
    ],
};

pub const CLARIFIER: Table = Table {
    name: "clarifier state",
    entries: &[("OFF", "0"), ("ON", "1")],
};

pub const POWER: [(&str, u32); 4] = [("LOW", 5), ("MID", 20), ("HIGH", 50), ("MAX", 100)];

pub fn power_preset(name: &str) -> Option<u32> {
    POWER
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, w)| *w)
}

// CTCSS code nnn is the index in this list
const TONES: [&str; 50] = [
    "67.0 Hz", "69.3 Hz", "71.9 Hz", "74.4 Hz", "77.0 Hz", "79.7 Hz", "82.5 Hz", "85.4 Hz",
    "88.5 Hz", "91.5 Hz", "94.8 Hz", "97.4 Hz", "100.0 Hz", "103.5 Hz", "107.2 Hz", "110.9 Hz",
    "114.8 Hz", "118.8 Hz", "123.0 Hz", "127.3 Hz", "131.8 Hz", "136.5 Hz", "141.3 Hz",
    "146.2 Hz", "151.4 Hz", "156.7 Hz", "159.8 Hz", "162.2 Hz", "165.5 Hz", "167.9 Hz",
    "171.3 Hz", "173.8 Hz", "177.3 Hz", "179.9 Hz", "183.5 Hz", "186.2 Hz", "189.9 Hz",
    "192.8 Hz", "196.6 Hz", "199.5 Hz", "203.5 Hz", "206.5 Hz", "210.7 Hz", "218.1 Hz",
    "225.7 Hz", "229.1 Hz", "233.6 Hz", "241.8 Hz", "250.3 Hz", "254.1 Hz",
];

// DCS code nnn is the index in this list
const DCS_CODES: [&str; 104] = [
    "23", "25", "26", "31", "32", "36", "43", "47", "51", "53", "54", "65", "71", "72", "73",
    "74", "114", "115", "116", "122", "125", "131", "132", "134", "143", "145", "152", "155",
    "156", "162", "165", "172", "174", "205", "212", "223", "225", "226", "243", "244", "245",
    "246", "251", "252", "255", "261", "263", "265", "266", "271", "274", "306", "311", "315",
    "325", "331", "332", "343", "346", "351", "356", "364", "365", "371", "411", "412", "413",
    "423", "431", "432", "445", "446", "452", "454", "455", "462", "464", "465", "466", "503",
    "506", "516", "523", "526", "532", "546", "565", "606", "612", "624", "627", "631", "632",
    "654", "662", "664", "703", "712", "723", "731", "732", "734", "743", "754",
];

fn index_code(index: usize) -> String {
    format!("{index:03}")
}

fn code_index(code: &str, len: usize) -> Option<usize> {
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse::<usize>().ok().filter(|i| *i < len)
}

// "100 Hz", "100.0Hz" and "100" all mean "100.0 Hz"
fn normalize_tone(tone: &str) -> Option<String> {
    let value = tone.trim().trim_end_matches("Hz").trim_end_matches("hz").trim();
    let hz = value.parse::<f64>().ok()?;
    Some(format!("{hz:.1} Hz"))
}

pub fn tone_code(tone: &str) -> Result<String, CatError> {
    normalize_tone(tone)
        .and_then(|t| TONES.iter().position(|x| *x == t))
        .map(index_code)
        .ok_or_else(|| CatError::Invalid(format!("invalid CTCSS tone '{}'", tone.trim())))
}

pub fn tone_name(code: &str) -> Result<&'static str, CatError> {
    code_index(code, TONES.len())
        .map(|i| TONES[i])
        .ok_or_else(|| CatError::Invalid(format!("unknown CTCSS code '{code}'")))
}

pub fn dcs_code(dcs: &str) -> Result<String, CatError> {
    let dcs = dcs.trim();
    let normalized = dcs.trim_start_matches('0');
    DCS_CODES
        .iter()
        .position(|x| *x == normalized)
        .map(index_code)
        .ok_or_else(|| CatError::Invalid(format!("invalid DCS code '{dcs}'")))
}

pub fn dcs_name(code: &str) -> Result<&'static str, CatError> {
    code_index(code, DCS_CODES.len())
        .map(|i| DCS_CODES[i])
        .ok_or_else(|| CatError::Invalid(format!("unknown DCS code '{code}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_go_both_ways() {
        assert_eq!(MODE.code("FM").unwrap(), "4");
        assert_eq!(MODE.code("data-usb").unwrap(), "C");
        assert_eq!(MODE.text("E").unwrap(), "C4FM");
        assert_eq!(ENCODE.code("TONE ENC").unwrap(), "2");
        assert_eq!(SHIFT.text("2").unwrap(), "-RPT");
        assert_eq!(CLARIFIER.code("ON").unwrap(), "1");
        assert!(MODE.code("SSB").is_err());
        assert!(SHIFT.text("3").is_err());
    }

    #[test]
    fn ctcss_tones() {
        assert_eq!(tone_code("67.0 Hz").unwrap(), "000");
        assert_eq!(tone_code("100 Hz").unwrap(), "012");
        assert_eq!(tone_code("127.3").unwrap(), "019");
        assert_eq!(tone_code("254.1 Hz").unwrap(), "049");
        assert_eq!(tone_name("022").unwrap(), "141.3 Hz");
        assert!(tone_code("100.1 Hz").is_err());
        assert!(tone_name("050").is_err());
        assert!(tone_name("12").is_err());
    }

    #[test]
    fn dcs_codes() {
        assert_eq!(dcs_code("23").unwrap(), "000");
        assert_eq!(dcs_code("023").unwrap(), "000");
        assert_eq!(dcs_code("115").unwrap(), "017");
        assert_eq!(dcs_code("754").unwrap(), "103");
        assert_eq!(dcs_name("070").unwrap(), "445");
        assert!(dcs_code("24").is_err());
        assert!(dcs_name("104").is_err());
    }

    #[test]
    fn power_presets() {
        assert_eq!(power_preset("mid"), Some(20));
        assert_eq!(power_preset("MAX"), Some(100));
        assert_eq!(power_preset("huge"), None);
    }
}
