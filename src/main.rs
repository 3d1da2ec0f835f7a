use crate::argparse::{Commands, Kind, Layout, Operation, Page};
use anyhow::Result;
use arednmon::agent::source::{power, signal};
use arednmon::agent::{self, PowerOptions, SignalOptions};
use arednmon::aprs::SmsAlert;
use arednmon::config::{self, Settings};
use arednmon::ft991::console::Console;
use arednmon::ft991::{self, settings, Radio, SerialRadio};
use arednmon::rrdtool::Rrd;
use tracing::{info, Level};
// Include these modules as part of the binary crate, not the library crate
// as this contains the actual implementation of the logging facility
mod argparse;
mod logging;

fn layout_settings(layout: Layout) -> Settings {
    Settings::new(layout.docroot, layout.database_dir, layout.rrdtool)
}

async fn ft991_session(port: &str, dry_run: bool, echo: bool, operation: Operation) -> Result<()> {
    let mut radio: SerialRadio = if dry_run {
        Radio::dry_run()
    } else {
        ft991::open_serial(port, ft991::DEFAULT_BAUD).await?
    };
    radio.set_verbose(echo);
    match operation {
        Operation::BackupMemory { file } => {
            let count = settings::backup_memory(&mut radio, &file).await?;
            println!("{count} memory settings backed up to '{}'", file.display());
        }
        Operation::RestoreMemory { file } => {
            let count = settings::restore_memory(&mut radio, &file).await?;
            println!("{count} memory settings restored from '{}'", file.display());
        }
        Operation::BackupMenu { file } => {
            settings::backup_menu(&mut radio, &file).await?;
            println!("Menu settings backed up to '{}'", file.display());
        }
        Operation::RestoreMenu { file } => {
            settings::restore_menu(&mut radio, &file).await?;
            println!("Menu settings restored from '{}'", file.display());
        }
        Operation::Power { level } => {
            radio.set_power_level(&level).await?;
            println!("Power set to {level}");
        }
        Operation::Passthrough => Console::stdin().passthrough(&mut radio).await?,
        Operation::Interactive => Console::stdin().run(&mut radio).await?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    config::load_env();
    let cli = argparse::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _guards = logging::init(level, cli.console, Some(cli.log_file.as_path()));

    match cli.command {
        Commands::Signal {
            page,
            url,
            interval,
            chart_interval,
            relay,
            layout,
        } => {
            let options = SignalOptions {
                page: match page {
                    Page::Json => signal::Page::Json,
                    Page::Status => signal::Page::Status,
                },
                url,
                request_minutes: interval,
                chart_minutes: chart_interval,
                relay,
            };
            agent::signal_agent(&layout_settings(layout), options)?.run().await?;
        }
        Commands::Power {
            bus,
            mux_channel,
            interval,
            database_interval,
            chart_interval,
            layout,
        } => {
            let options = PowerOptions {
                bus,
                mux_channel,
                request_secs: interval,
                database_secs: database_interval,
                chart_secs: chart_interval,
            };
            agent::power_agent(&layout_settings(layout), options)?.run().await?;
        }
        Commands::CreateRrd { kind, layout } => {
            let settings = layout_settings(layout);
            let (file, spec) = match kind {
                Kind::Signal => (signal::DATABASE, signal::database()),
                Kind::Power => (power::DATABASE, power::database()),
            };
            std::fs::create_dir_all(&settings.database_dir)?;
            Rrd::new(&settings.rrdtool, settings.database(file))
                .create(&spec)
                .await?;
        }
        Commands::Ft991 {
            port,
            dry_run,
            echo,
            operation,
        } => ft991_session(&port, dry_run, echo, operation).await?,
        Commands::Sms {
            phone,
            message,
            callsign,
            passcode,
            host,
            aprs_port,
            server,
        } => {
            let alert = SmsAlert {
                callsign,
                passcode,
                host,
                port: aprs_port,
                server,
            };
            alert.send_sms(&phone, &message.join(" ")).await?;
        }
    }
    info!("done");
    Ok(())
}
