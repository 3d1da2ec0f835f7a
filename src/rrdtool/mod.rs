// Thin wrapper around the rrdtool command line program.
// Arguments are handed over as a vector, never through a shell.

pub mod create;
pub mod graph;

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, trace};

pub use create::{DataSource, DatabaseSpec};
pub use graph::{ChartSpec, Period, Trend};

pub const DEFAULT_PROGRAM: &str = "rrdtool";

// "1578694621: -48 -95 47 15 15 130 130"
const LAST_UPDATE: &str = r"^\s*(\d+):";

/// One row to append: epoch seconds plus the data source values,
/// in the same order as the database was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub time: i64,
    pub values: Vec<String>,
}

impl Update {
    pub fn new(time: i64, values: Vec<String>) -> Self {
        Self { time, values }
    }

    fn template(&self) -> String {
        let mut s = self.time.to_string();
        for v in self.values.iter() {
            s.push(':');
            s.push_str(v);
        }
        s
    }
}

#[derive(Debug, Clone)]
pub struct Rrd {
    program: String,
    path: PathBuf,
}

impl Rrd {
    pub fn new(program: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn run(&self, args: Vec<String>) -> Result<String> {
        trace!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("running {}", self.program))?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            bail!(
                "{} {} failed ({}): {}",
                self.program,
                args.first().map(String::as_str).unwrap_or(""),
                output.status,
                text.trim()
            );
        }
        Ok(text)
    }

    pub fn create_args(&self, spec: &DatabaseSpec) -> Vec<String> {
        let mut args = vec!["create".to_string(), self.path_arg()];
        args.extend(spec.args());
        args
    }

    /// Creates the database unless it already exists.
    pub async fn create(&self, spec: &DatabaseSpec) -> Result<()> {
        if self.exists() {
            info!("database {} already exists", self.path.display());
            return Ok(());
        }
        let args = self.create_args(spec);
        info!("creating database: {} {}", self.program, args.join(" "));
        self.run(args).await?;
        Ok(())
    }

    pub fn update_args(&self, updates: &[Update]) -> Vec<String> {
        let mut args = vec!["update".to_string(), self.path_arg()];
        args.extend(updates.iter().map(Update::template));
        args
    }

    pub async fn update(&self, updates: &[Update]) -> Result<()> {
        if updates.is_empty() {
            debug!("nothing to add to {}", self.path.display());
            return Ok(());
        }
        self.run(self.update_args(updates)).await?;
        debug!("added {} data points to database", updates.len());
        Ok(())
    }

    /// Epoch seconds of the most recent update, if the database has any.
    pub async fn last_update(&self) -> Result<Option<i64>> {
        let args = vec!["lastupdate".to_string(), self.path_arg()];
        let text = self.run(args).await?;
        parse_last_update(&text)
    }

    pub fn graph_args(&self, chart: &ChartSpec, dir: &Path) -> Vec<String> {
        chart.args(&self.path_arg(), dir)
    }

    pub async fn graph(&self, chart: &ChartSpec, dir: &Path) -> Result<()> {
        let result = self.run(self.graph_args(chart, dir)).await?;
        trace!("rrdtool graph: {}", result.trim());
        Ok(())
    }

    fn path_arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

pub fn parse_last_update(text: &str) -> Result<Option<i64>> {
    let re = Regex::new(LAST_UPDATE)?;
    let line = match text.lines().filter(|l| !l.trim().is_empty()).last() {
        Some(line) => line,
        None => return Ok(None),
    };
    match re.captures(line) {
        Some(result) => Ok(Some(result[1].parse::<i64>()?)),
        None => Ok(None),
    }
}
