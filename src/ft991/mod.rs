// Yaesu FT-991 CAT (Computer Aided Transceiver) control over a serial link

pub mod codec;
pub mod console;
pub mod memory;
pub mod settings;
pub mod tables;

pub use codec::CatCodec;
pub use memory::MemoryChannel;

use futures::{SinkExt, StreamExt};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{self, Duration};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tokio_util::codec::{Decoder, Framed};
use tracing::{debug, trace};

#[cfg(unix)]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM5";

pub const DEFAULT_BAUD: u32 = 9600;

// silence on the line for this long ends an answer
const CHAR_TIMEOUT: Duration = Duration::from_millis(100);
const SETTLE: Duration = Duration::from_millis(100);

pub const REJECTED: &str = "?;";

#[derive(Debug, Error)]
pub enum CatError {
    #[error("serial port error: {0}")]
    Io(#[from] io::Error),
    #[error("serial read buffer overflow")]
    Overflow,
    #[error("{0} error")]
    Rejected(String),
    #[error("{0}")]
    Invalid(String),
    #[error("unexpected answer '{answer}' to {command}")]
    Answer { command: String, answer: String },
}

/// An FT-991 behind any byte stream. Without a link the radio runs
/// dry: commands are only formatted (and echoed when verbose).
pub struct Radio<T> {
    link: Option<Framed<T, CatCodec>>,
    verbose: bool,
}

pub type SerialRadio = Radio<SerialStream>;

/// Opens the serial port, 8N1 at `baud`.
pub async fn open_serial(port: &str, baud: u32) -> Result<SerialRadio, CatError> {
    #[allow(unused_mut)]
    let mut stream = tokio_serial::new(port, baud)
        .open_native_async()
        .map_err(|e| {
            CatError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("{port}: {e}. Be sure the USB cable is connected to the FT991 and the radio is ON."),
            ))
        })?;
    #[cfg(unix)]
    stream.set_exclusive(false).map_err(io::Error::from)?;
    time::sleep(SETTLE).await;
    debug!("opened {port} at {baud} baud");
    Ok(Radio::new(stream))
}

impl<T: AsyncRead + AsyncWrite + Unpin> Radio<T> {
    pub fn new(stream: T) -> Self {
        Self {
            link: Some(CatCodec.framed(stream)),
            verbose: false,
        }
    }

    pub fn dry_run() -> Self {
        Self {
            link: None,
            verbose: false,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.link.is_none()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Sends a raw command and returns the answer, possibly empty.
    pub async fn send_command(&mut self, command: &str) -> Result<String, CatError> {
        if self.verbose {
            print!("{command} ");
        }
        let answer = match self.link.as_mut() {
            Some(link) => {
                link.send(command.to_string()).await?;
                receive(link).await?
            }
            None => String::new(),
        };
        if self.verbose {
            println!("{answer}");
        }
        trace!("{command} -> {answer}");
        Ok(answer)
    }

    // a set command whose only possible answer is a rejection
    async fn set(&mut self, command: &str, what: &str) -> Result<(), CatError> {
        let answer = self.send_command(command).await?;
        if answer == REJECTED {
            return Err(CatError::Rejected(what.into()));
        }
        Ok(())
    }

    // the `len` characters following `prefix` in the answer to `command`
    async fn query(&mut self, command: &str, prefix: &str, len: usize) -> Result<String, CatError> {
        let answer = self.send_command(command).await?;
        if let Some(value) = answer.strip_prefix(prefix).and_then(|rest| rest.get(..len)) {
            return Ok(value.to_string());
        }
        Err(CatError::Answer {
            command: command.into(),
            answer,
        })
    }

    /// Contents of a memory location, `None` when the location is empty.
    pub async fn get_memory(&mut self, location: u16) -> Result<Option<MemoryChannel>, CatError> {
        let answer = self.send_command(&format!("MT{location:03};")).await?;
        if answer == REJECTED || answer.is_empty() {
            return Ok(None);
        }
        MemoryChannel::decode(&answer).map(Some)
    }

    pub async fn set_memory(&mut self, channel: &MemoryChannel) -> Result<(), CatError> {
        let command = channel.encode()?;
        self.set(&command, "set memory").await
    }

    /// CTCSS tone of the current memory location, e.g. "100.0 Hz".
    pub async fn get_ctcss(&mut self) -> Result<&'static str, CatError> {
        let code = self.query("CN00;", "CN00", 3).await?;
        tables::tone_name(&code)
    }

    pub async fn set_ctcss(&mut self, tone: &str) -> Result<(), CatError> {
        let command = format!("CN00{};", tables::tone_code(tone)?);
        self.set(&command, "set CTCSS").await
    }

    /// DCS code of the current memory location, e.g. "23".
    pub async fn get_dcs(&mut self) -> Result<&'static str, CatError> {
        let code = self.query("CN01;", "CN01", 3).await?;
        tables::dcs_name(&code)
    }

    pub async fn set_dcs(&mut self, dcs: &str) -> Result<(), CatError> {
        let command = format!("CN01{};", tables::dcs_code(dcs)?);
        self.set(&command, "set DCS").await
    }

    pub async fn get_rx_clarifier(&mut self) -> Result<&'static str, CatError> {
        let state = self.query("RT;", "RT", 1).await?;
        tables::CLARIFIER.text(&state)
    }

    pub async fn set_rx_clarifier(&mut self, state: &str) -> Result<(), CatError> {
        let command = format!("RT{};", tables::CLARIFIER.code(state)?);
        self.set(&command, "set rx clarifier").await
    }

    pub async fn get_tx_clarifier(&mut self) -> Result<&'static str, CatError> {
        let state = self.query("XT;", "XT", 1).await?;
        tables::CLARIFIER.text(&state)
    }

    pub async fn set_tx_clarifier(&mut self, state: &str) -> Result<(), CatError> {
        let command = format!("XT{};", tables::CLARIFIER.code(state)?);
        self.set(&command, "set tx clarifier").await
    }

    pub async fn set_memory_location(&mut self, location: u16) -> Result<(), CatError> {
        if !memory::LOCATIONS.contains(&location) {
            return Err(CatError::Invalid(
                "Memory location must be an integer between 1 and 118, inclusive.".into(),
            ));
        }
        self.set(&format!("MC{location:03};"), "set memory location").await
    }

    /// Transmit power in watts, 5 to 100.
    pub async fn set_power(&mut self, watts: u32) -> Result<(), CatError> {
        if !(5..=100).contains(&watts) {
            return Err(CatError::Invalid(
                "Power must be between 5 and 100 watts, inclusive.".into(),
            ));
        }
        self.set(&format!("PC{watts:03};"), "set power").await
    }

    /// Transmit power from a preset name or a number of watts.
    pub async fn set_power_level(&mut self, level: &str) -> Result<(), CatError> {
        let watts = match tables::power_preset(level) {
            Some(watts) => watts,
            None => level.trim().parse().map_err(|_| {
                CatError::Invalid(format!("Unknown power level '{level}', try LOW, MID, HIGH, MAX or watts."))
            })?,
        };
        self.set_power(watts).await
    }
}

// Reads one answer: up to and including ';', or whatever arrived before
// the line went quiet. Input left over afterwards is discarded.
async fn receive<T: AsyncRead + AsyncWrite + Unpin>(
    link: &mut Framed<T, CatCodec>,
) -> Result<String, CatError> {
    let mut pending = link.read_buffer().len();
    let answer = loop {
        match time::timeout(CHAR_TIMEOUT, link.next()).await {
            Ok(Some(Ok(answer))) => break answer,
            Ok(Some(Err(e))) => {
                resync(link).await;
                return Err(e);
            }
            Ok(None) => break String::new(),
            Err(_) => {
                let arrived = link.read_buffer().len();
                if arrived > pending {
                    pending = arrived;
                    continue;
                }
                let partial = link.read_buffer_mut().split();
                break String::from_utf8_lossy(&partial).into_owned();
            }
        }
    };
    link.read_buffer_mut().clear();
    Ok(answer)
}

// After a decoding error the stream yields a single None, then resumes.
// Drop that, and whatever is left of the runaway answer, so the next
// command gets its own answer.
async fn resync<T: AsyncRead + AsyncWrite + Unpin>(link: &mut Framed<T, CatCodec>) {
    let _ = time::timeout(CHAR_TIMEOUT, link.next()).await;
    loop {
        link.read_buffer_mut().clear();
        match time::timeout(CHAR_TIMEOUT, link.next()).await {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
    link.read_buffer_mut().clear();
    debug!("discarded the overflowing answer");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn answer_is_read_up_to_the_terminator() {
        let (near, mut far) = tokio::io::duplex(256);
        let mut radio = Radio::new(near);
        let radio_side = tokio::spawn(async move {
            let mut buf = [0u8; 5];
            far.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"MC01;");
            far.write_all(b"MC001;").await.unwrap();
            far
        });
        assert_eq!(radio.send_command("MC01;").await.unwrap(), "MC001;");
        radio_side.await.unwrap();
    }

    #[tokio::test]
    async fn silence_is_an_empty_answer() {
        let (near, _far) = tokio::io::duplex(256);
        let mut radio = Radio::new(near);
        assert_eq!(radio.send_command("MC005;").await.unwrap(), "");
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let mut radio: Radio<tokio::io::DuplexStream> = Radio::dry_run();
        assert!(radio.is_dry_run());
        assert_eq!(radio.send_command("IF;").await.unwrap(), "");
        assert_eq!(radio.get_memory(1).await.unwrap(), None);
        radio.set_memory_location(1).await.unwrap();
        assert!(radio.set_memory_location(119).await.is_err());
        assert!(radio.set_power(4).await.is_err());
        assert!(radio.set_ctcss("42 Hz").await.is_err());
    }

    #[tokio::test]
    async fn rejected_command() {
        let (near, mut far) = tokio::io::duplex(256);
        let mut radio = Radio::new(near);
        far.write_all(b"?;").await.unwrap();
        let err = radio.set_power(50).await.unwrap_err();
        assert!(matches!(err, CatError::Rejected(_)));
        assert_eq!(err.to_string(), "set power error");
    }

    #[tokio::test]
    async fn link_recovers_after_overflow() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut radio = Radio::new(near);
        let radio_side = tokio::spawn(async move {
            far.write_all(&[b'A'; codec::MAX_ANSWER + 76]).await.unwrap();
            let mut command = Vec::new();
            let mut byte = [0u8; 1];
            let mut answered = 0;
            while far.read(&mut byte).await.unwrap_or(0) == 1 {
                command.push(byte[0]);
                if byte[0] != b';' {
                    continue;
                }
                // the first command only ever saw the runaway answer
                if command != b"IF;" {
                    far.write_all(&command).await.unwrap();
                    answered += 1;
                }
                command.clear();
            }
            answered
        });

        let err = radio.send_command("IF;").await.unwrap_err();
        assert!(matches!(err, CatError::Overflow));
        assert_eq!(radio.send_command("MC001;").await.unwrap(), "MC001;");
        assert_eq!(radio.send_command("MC002;").await.unwrap(), "MC002;");
        drop(radio);
        assert_eq!(radio_side.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn power_presets_and_watts() {
        let (near, mut far) = tokio::io::duplex(256);
        let mut radio = Radio::new(near);
        radio.set_power_level("high").await.unwrap();
        radio.set_power_level(" 35 ").await.unwrap();
        assert!(matches!(
            radio.set_power_level("loud").await,
            Err(CatError::Invalid(_))
        ));
        drop(radio);
        let mut sent = String::new();
        far.read_to_string(&mut sent).await.unwrap();
        assert_eq!(sent, "PC050;PC035;");
    }
}
