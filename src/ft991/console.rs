// Interactive front end of the FT991 utility

use super::memory::LOCATIONS;
use super::settings::{self, MENU_ITEMS, MEMORY_FILE, MENU_FILE};
use super::{Radio, REJECTED};
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader, Lines, Stdin};

const MENU: &str = "
Enter a command from the following list:
    m - show this menu
    bm - backup memory to file
    rm - restore memory from file
    bu - backup menu to file
    ru - restore menu from file
    p - enter CAT passthrough mode
    v - toggle verbose mode
    x - exit this program";

const PASSTHROUGH: &str = "
Entering passthrough mode. Enter an FT991 command, e.g. \"IF;\",
or one of the following commands
    exit - leave passthrough mode
    rmem - print out all memory channels
    rmenu - print out all menu settings";

pub struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    // None at end of input
    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    async fn file_name(&mut self, default: &str) -> Result<PathBuf> {
        let name = self
            .prompt("Enter file name or <CR> for default: ")
            .await?
            .unwrap_or_default();
        let name = name.trim();
        Ok(PathBuf::from(if name.is_empty() { default } else { name }))
    }

    // a file to restore from, None when it does not exist
    async fn existing_file(&mut self, default: &str) -> Result<Option<PathBuf>> {
        let path = self.file_name(default).await?;
        if path.is_file() {
            return Ok(Some(path));
        }
        println!("File not found: '{}'. Please enter a valid file name.", path.display());
        Ok(None)
    }

    /// The command menu loop, until `x` or end of input.
    pub async fn run<T: AsyncRead + AsyncWrite + Unpin>(&mut self, radio: &mut Radio<T>) -> Result<()> {
        println!("{MENU}");
        while let Some(line) = self.prompt(">").await? {
            match line.trim() {
                "" => (),
                "m" => println!("{MENU}"),
                "bm" => {
                    let path = self.file_name(MEMORY_FILE).await?;
                    println!("Backing up memory settings...");
                    let count = settings::backup_memory(radio, &path).await?;
                    println!("{count} memory settings backed up to '{}'", path.display());
                }
                "rm" => {
                    let Some(path) = self.existing_file(MEMORY_FILE).await? else {
                        continue;
                    };
                    println!("Restoring memory settings...");
                    let count = settings::restore_memory(radio, &path).await?;
                    println!("{count} memory settings restored from '{}'", path.display());
                }
                "bu" => {
                    let path = self.file_name(MENU_FILE).await?;
                    println!("Backing up menu settings...");
                    settings::backup_menu(radio, &path).await?;
                    println!("Menu settings backed up to '{}'", path.display());
                }
                "ru" => {
                    let Some(path) = self.existing_file(MENU_FILE).await? else {
                        continue;
                    };
                    println!("Restoring menu settings...");
                    settings::restore_menu(radio, &path).await?;
                    println!("Menu settings restored from '{}'", path.display());
                }
                "p" => self.passthrough(radio).await?,
                "v" => {
                    radio.set_verbose(!radio.verbose());
                    println!("Verbose is {}", if radio.verbose() { "ON" } else { "OFF" });
                }
                "x" => break,
                _ => println!("invalid command"),
            }
        }
        Ok(())
    }

    /// Raw CAT commands typed by the user, until `exit` or end of input.
    pub async fn passthrough<T: AsyncRead + AsyncWrite + Unpin>(&mut self, radio: &mut Radio<T>) -> Result<()> {
        println!("{PASSTHROUGH}");
        while let Some(line) = self.prompt("CAT# ").await? {
            let command = line.trim().to_uppercase();
            match command.as_str() {
                "" => continue,
                "EXIT" => break,
                "RMEM" => dump_memory(radio).await?,
                "RMENU" => dump_menu(radio).await?,
                _ => {
                    let answer = radio.send_command(&terminate(command)).await?;
                    if !answer.is_empty() {
                        println!("{answer}");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Appends the ';' terminator when missing.
pub fn terminate(mut command: String) -> String {
    if !command.ends_with(';') {
        command.push(';');
    }
    command
}

async fn dump_memory<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>) -> Result<()> {
    for location in LOCATIONS {
        let answer = radio.send_command(&format!("MT{location:03};")).await?;
        if answer != REJECTED {
            println!("{location:03}: {answer}");
        }
    }
    Ok(())
}

async fn dump_menu<T: AsyncRead + AsyncWrite + Unpin>(radio: &mut Radio<T>) -> Result<()> {
    for item in MENU_ITEMS {
        let answer = radio.send_command(&format!("EX{item:03};")).await?;
        println!("{item:03}: {}", answer.get(5..).unwrap_or_default());
    }
    Ok(())
}
