// SMS alerts through the SMS gateway of an APRS-IS server

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

pub const DEFAULT_HOST: &str = "ai7nc-aprs-is-vm.local.mesh";
pub const DEFAULT_PORT: u16 = 14580;
pub const DEFAULT_SERVER: &str = "AI7NC-30";

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SmsAlert {
    pub callsign: String,
    pub passcode: String,
    pub host: String,
    pub port: u16,
    pub server: String,
}

async fn next_line(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> Result<String> {
    match timeout(TIMEOUT, lines.next_line()).await {
        Ok(Ok(Some(line))) => Ok(line),
        Ok(Ok(None)) => bail!("connection closed by APRS-IS server"),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => bail!("timeout waiting for APRS-IS server"),
    }
}

// "# logresp N0CALL verified, server AI7NC-30"
fn is_verified(response: &str) -> bool {
    response
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == "verified")
}

impl SmsAlert {
    pub fn new(callsign: &str, passcode: &str) -> Self {
        Self {
            callsign: callsign.into(),
            passcode: passcode.into(),
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            server: DEFAULT_SERVER.into(),
        }
    }

    /// The APRS message line asking the gateway to text `phone`.
    pub fn message(&self, phone: &str, text: &str) -> String {
        format!("{}>{}::SMSGTE:@{} {}\n", self.callsign, self.server, phone, text)
    }

    pub async fn send_sms(&self, phone: &str, text: &str) -> Result<()> {
        let address = format!("{}:{}", self.host, self.port);
        let stream = timeout(TIMEOUT, TcpStream::connect(&address))
            .await
            .with_context(|| format!("timeout connecting to {address}"))?
            .with_context(|| format!("connecting to {address}"))?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let banner = next_line(&mut lines).await?;
        debug!("{banner}");
        if !banner.starts_with('#') {
            bail!("unexpected APRS-IS banner '{banner}'");
        }

        let login = format!("user {} pass {}\n", self.callsign, self.passcode);
        writer.write_all(login.as_bytes()).await?;
        let response = loop {
            let line = next_line(&mut lines).await?;
            debug!("{line}");
            if line.contains(&self.server) {
                break line;
            }
        };
        if !is_verified(&response) {
            bail!("unverified user {}: {}", self.callsign, response);
        }

        let message = self.message(phone, text);
        writer.write_all(message.as_bytes()).await?;
        writer.flush().await?;
        info!("sms sent to {phone} through {}", self.server);
        Ok(())
    }
}
