// Deployment layout shared by the agents.
//
// Everything lives under the invoking user's home directory unless
// overridden from the command line, the environment or a .env file:
//
//   <docroot>/<agent>/dynamic/   charts and JSON snapshots
//   <database_dir>/<name>.rrd    round robin databases

use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

pub const DOCROOT: &str = "AREDNMON_DOCROOT";
pub const DATABASE_DIR: &str = "AREDNMON_DATABASE_DIR";
pub const RRDTOOL: &str = "AREDNMON_RRDTOOL";

const DYNAMIC: &str = "dynamic";

/// Loads a .env file, if any, so that its variables are visible
/// to the command line parser.
pub fn load_env() {
    dotenv().ok();
}

fn home() -> PathBuf {
    user_home(env::var("USER").ok(), env::var("HOME").ok())
}

// /home/$USER, falling back to $HOME for accounts without a USER
fn user_home(user: Option<String>, home: Option<String>) -> PathBuf {
    match (user.filter(|u| !u.is_empty()), home) {
        (Some(user), _) => PathBuf::from("/home").join(user),
        (None, Some(home)) => PathBuf::from(home),
        (None, None) => PathBuf::from("/home"),
    }
}

pub fn default_docroot() -> PathBuf {
    home().join("public_html")
}

pub fn default_database_dir() -> PathBuf {
    home().join("database")
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub docroot: PathBuf,
    pub database_dir: PathBuf,
    pub rrdtool: String,
}

impl Settings {
    pub fn new(docroot: PathBuf, database_dir: PathBuf, rrdtool: String) -> Self {
        Self {
            docroot,
            database_dir,
            rrdtool,
        }
    }

    /// Where an agent drops its charts and snapshots.
    pub fn dynamic_dir(&self, site: &str) -> PathBuf {
        self.docroot.join(site).join(DYNAMIC)
    }

    pub fn database(&self, file: &str) -> PathBuf {
        self.database_dir.join(file)
    }
}
