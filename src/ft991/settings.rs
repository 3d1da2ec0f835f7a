// Backup and restore of memory channels and menu settings

use super::memory::{self, format_mhz, on_off, parse_mhz, parse_on_off, MemoryChannel};
use super::{CatError, Radio, REJECTED};
use anyhow::{Context, Result};
use std::ops::RangeInclusive;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

pub const MEMORY_FILE: &str = "ft991mem.csv";
pub const MENU_FILE: &str = "ft991menu.cfg";

pub const MEMORY_HEADER: &str = "Memory Ch,Rx Frequency,Tx Frequency,Offset,Repeater Shift,Mode,Tag,Encoding,Tone,DCS,Clarifier, RxClar, TxClar";

pub const MENU_ITEMS: RangeInclusive<u16> = 1..=153;

// read only, the radio rejects writing it
const READ_ONLY_MENU: &str = "EX087";

const CSV_FIELDS: usize = 13;

/// One memory backup row: the channel plus the squelch settings that
/// are only reachable once the location is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub channel: MemoryChannel,
    pub tone: String,
    pub dcs: String,
}

impl MemoryRow {
    /// Tx frequency and offset are left blank, the radio derives them.
    pub fn to_csv(&self) -> String {
        let ch = &self.channel;
        format!(
            "{},{},,,{},{},{},{},{},{},{},{},{},",
            ch.location,
            format_mhz(ch.rx_freq),
            ch.shift,
            ch.mode,
            ch.tag,
            ch.encode,
            self.tone,
            self.dcs,
            ch.clarifier,
            on_off(ch.rx_clarifier),
            on_off(ch.tx_clarifier),
        )
    }

    /// Parses a backup row. Lines not starting with a location number,
    /// such as the header, yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CatError> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields[0].is_empty() || !fields[0].bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        if fields.len() < CSV_FIELDS {
            return Err(CatError::Invalid(format!("incomplete memory row '{line}'")));
        }
        let location = fields[0]
            .parse()
            .map_err(|_| CatError::Invalid(format!("invalid memory location '{}'", fields[0])))?;
        let clarifier = fields[10].trim().parse().map_err(|_| {
            CatError::Invalid(format!("invalid clarifier offset '{}'", fields[10]))
        })?;
        let channel = MemoryChannel {
            location,
            rx_freq: parse_mhz(fields[1])?,
            clarifier,
            rx_clarifier: parse_on_off(fields[11])?,
            tx_clarifier: parse_on_off(fields[12])?,
            mode: fields[5].trim().into(),
            encode: fields[7].trim().into(),
            shift: fields[4].trim().into(),
            tag: fields[6].into(),
        };
        Ok(Some(Self {
            channel,
            tone: fields[8].trim().into(),
            dcs: fields[9].trim().into(),
        }))
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> Radio<T> {
    /// Header plus one CSV row per programmed memory location.
    pub async fn read_memory_settings(&mut self) -> Result<Vec<String>, CatError> {
        let mut lines = vec![MEMORY_HEADER.to_string()];
        for location in memory::LOCATIONS {
            let channel = match self.get_memory(location).await? {
                Some(channel) => channel,
                None => continue,
            };
            self.set_memory_location(location).await?;
            let tone = self.get_ctcss().await?.to_string();
            let dcs = self.get_dcs().await?.to_string();
            lines.push(MemoryRow { channel, tone, dcs }.to_csv());
        }
        debug!("read {} memory locations", lines.len() - 1);
        Ok(lines)
    }

    /// Programs every row, returning how many locations were written.
    pub async fn write_memory_settings(&mut self, lines: &[String]) -> Result<usize, CatError> {
        let mut written = 0;
        for line in lines {
            let row = match MemoryRow::parse(line)? {
                Some(row) => row,
                None => continue,
            };
            self.set_memory(&row.channel).await?;
            self.set_memory_location(row.channel.location).await?;
            self.set_ctcss(&row.tone).await?;
            self.set_dcs(&row.dcs).await?;
            self.set_rx_clarifier(on_off(row.channel.rx_clarifier)).await?;
            self.set_tx_clarifier(on_off(row.channel.tx_clarifier)).await?;
            written += 1;
        }
        Ok(written)
    }

    pub async fn read_menu_settings(&mut self) -> Result<Vec<String>, CatError> {
        let mut lines = Vec::with_capacity(MENU_ITEMS.len());
        for item in MENU_ITEMS {
            lines.push(self.send_command(&format!("EX{item:03};")).await?);
        }
        Ok(lines)
    }

    pub async fn write_menu_settings(&mut self, lines: &[String]) -> Result<usize, CatError> {
        let mut written = 0;
        for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            if line.contains(READ_ONLY_MENU) {
                continue;
            }
            let answer = self.send_command(line).await?;
            if answer.contains(REJECTED) {
                return Err(CatError::Rejected(format!("restoring menu setting {line}")));
            }
            written += 1;
        }
        Ok(written)
    }
}

async fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    fs::write(path, text)
        .await
        .with_context(|| format!("write {}", path.display()))
}

async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).await.with_context(|| {
        format!(
            "file {} not found. Be sure to enter the full or relative path name of the file",
            path.display()
        )
    })?;
    Ok(text.lines().map(|l| l.trim().to_string()).collect())
}

pub async fn backup_memory<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>, path: &Path) -> Result<usize> {
    info!("backing up memory settings to {}", path.display());
    let lines = radio.read_memory_settings().await?;
    write_lines(path, &lines).await?;
    Ok(lines.len() - 1)
}

pub async fn restore_memory<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>, path: &Path) -> Result<usize> {
    let lines = read_lines(path).await?;
    info!("restoring memory settings from {}", path.display());
    radio.write_memory_settings(&lines).await.with_context(|| {
        format!(
            "memory settings restore failed, the settings file {} is most likely corrupted or incorrectly formatted",
            path.display()
        )
    })
}

pub async fn backup_menu<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>, path: &Path) -> Result<usize> {
    info!("backing up menu settings to {}", path.display());
    let lines = radio.read_menu_settings().await?;
    write_lines(path, &lines).await?;
    Ok(lines.len())
}

pub async fn restore_menu<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>, path: &Path) -> Result<usize> {
    let lines = read_lines(path).await?;
    info!("restoring menu settings from {}", path.display());
    radio
        .write_menu_settings(&lines)
        .await
        .with_context(|| format!("menu settings restore from {} failed", path.display()))
}
