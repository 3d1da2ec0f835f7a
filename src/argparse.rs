use arednmon::agent::source::power;
use arednmon::{aprs, config, ft991, rrdtool};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub fn parse() -> Cli {
    Cli::parse()
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Also log to the console
    #[arg(short, long)]
    pub console: bool,

    /// Log to a file
    #[arg(short, long, value_name = "FILE", default_value = "arednmon.log")]
    pub log_file: PathBuf,

    /// Verbose logging, repeat for more (-vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct Layout {
    /// Web server document root
    #[arg(long, value_name = "DIR", env = config::DOCROOT, default_value = config::default_docroot().into_os_string())]
    pub docroot: PathBuf,

    /// Round robin database directory
    #[arg(long, value_name = "DIR", env = config::DATABASE_DIR, default_value = config::default_database_dir().into_os_string())]
    pub database_dir: PathBuf,

    /// rrdtool program
    #[arg(long, value_name = "PROGRAM", env = config::RRDTOOL, default_value = rrdtool::DEFAULT_PROGRAM)]
    pub rrdtool: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// AREDN node signal quality agent
    Signal {
        /// Node page format
        #[arg(short, long, value_enum, default_value_t = Page::Status)]
        page: Page,

        /// Node page URL [default: depends on the page format]
        #[arg(short, long, env = "AREDNMON_NODE_URL")]
        url: Option<String>,

        /// Request interval in minutes [default: 60 json, 1 status]
        #[arg(short = 't', long, value_name = "MINUTES")]
        interval: Option<u64>,

        /// Chart refresh interval in minutes [default: 10 status]
        #[arg(long, value_name = "MINUTES")]
        chart_interval: Option<u64>,

        /// Also publish the raw node response
        #[arg(short, long)]
        relay: bool,

        #[command(flatten)]
        layout: Layout,
    },

    /// Node power and temperature agent
    Power {
        /// I2C bus device
        #[arg(short, long, env = "AREDNMON_I2C_BUS", default_value = power::DEFAULT_BUS)]
        bus: String,

        /// TCA9548A multiplexer channel the sensors sit behind
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..8))]
        mux_channel: Option<u8>,

        /// Sensor request interval in seconds
        #[arg(short = 't', long, value_name = "SECS", default_value_t = 2)]
        interval: u64,

        /// Database update interval in seconds
        #[arg(long, value_name = "SECS", default_value_t = 30)]
        database_interval: u64,

        /// Chart refresh interval in seconds
        #[arg(long, value_name = "SECS", default_value_t = 600)]
        chart_interval: u64,

        #[command(flatten)]
        layout: Layout,
    },

    /// Create a round robin database
    CreateRrd {
        #[arg(value_enum)]
        kind: Kind,

        #[command(flatten)]
        layout: Layout,
    },

    /// Yaesu FT-991 memory and menu settings utility
    Ft991 {
        /// Serial port
        #[arg(short, long, env = "FT991_PORT", default_value = ft991::DEFAULT_PORT)]
        port: String,

        /// Format commands without sending them
        #[arg(short, long)]
        dry_run: bool,

        /// Echo commands and answers
        #[arg(long)]
        echo: bool,

        #[command(subcommand)]
        operation: Operation,
    },

    /// Send an SMS through an APRS-IS gateway
    Sms {
        /// Phone number
        phone: String,

        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Verified amateur radio callsign
        #[arg(long, env = "APRS_CALLSIGN")]
        callsign: String,

        /// APRS-IS passcode for the callsign
        #[arg(long, env = "APRS_PASSCODE", hide_env_values = true)]
        passcode: String,

        /// APRS-IS server host
        #[arg(long, env = "APRS_HOST", default_value = aprs::DEFAULT_HOST)]
        host: String,

        /// APRS-IS server port
        #[arg(long, env = "APRS_PORT", default_value_t = aprs::DEFAULT_PORT)]
        aprs_port: u16,

        /// APRS-IS server name
        #[arg(long, env = "APRS_SERVER", default_value = aprs::DEFAULT_SERVER)]
        server: String,
    },
}

#[derive(Subcommand)]
pub enum Operation {
    /// Back up memory channels to a CSV file
    BackupMemory {
        #[arg(default_value = ft991::settings::MEMORY_FILE)]
        file: PathBuf,
    },
    /// Restore memory channels from a CSV file
    RestoreMemory {
        #[arg(default_value = ft991::settings::MEMORY_FILE)]
        file: PathBuf,
    },
    /// Back up menu settings
    BackupMenu {
        #[arg(default_value = ft991::settings::MENU_FILE)]
        file: PathBuf,
    },
    /// Restore menu settings
    RestoreMenu {
        #[arg(default_value = ft991::settings::MENU_FILE)]
        file: PathBuf,
    },
    /// Set the transmit power
    Power {
        /// Watts (5-100) or a preset: LOW, MID, HIGH, MAX
        level: String,
    },
    /// Type CAT commands directly
    Passthrough,
    /// Interactive menu
    Interactive,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum Page {
    /// signal.json history (older firmware)
    Json,

    /// Status page (current firmware)
    Status,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum Kind {
    /// arednsigData.rrd
    Signal,

    /// powerData.rrd
    Power,
}
