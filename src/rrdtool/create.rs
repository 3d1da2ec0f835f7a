const SECONDS_PER_DAY: u32 = 86400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
}

/// Layout of a database: one GAUGE per data source, a full resolution
/// archive spanning one day and a consolidated archive spanning
/// `size_in_days`.
#[derive(Debug, Clone)]
pub struct DatabaseSpec {
    pub step: u32, // seconds between updates
    pub size_in_days: u32,
    pub steps_per_day: u32, // rows per day in the long term archive
    pub sources: Vec<DataSource>,
}

impl DatabaseSpec {
    pub fn new(step: u32, size_in_days: u32, steps_per_day: u32, names: &[&str]) -> Self {
        Self {
            step,
            size_in_days,
            steps_per_day,
            sources: names
                .iter()
                .map(|n| DataSource {
                    name: n.to_string(),
                })
                .collect(),
        }
    }

    pub fn heartbeat(&self) -> u32 {
        2 * self.step
    }

    pub fn day_rows(&self) -> u32 {
        SECONDS_PER_DAY / self.step
    }

    // primary data points consolidated into each long term row
    pub fn long_term_pdp(&self) -> u32 {
        let pdp = SECONDS_PER_DAY as f64 / (self.steps_per_day * self.step) as f64;
        (pdp.round() as u32).max(1)
    }

    pub fn long_term_rows(&self) -> u32 {
        self.steps_per_day * self.size_in_days
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--start".to_string(),
            "now-1day".to_string(),
            "--step".to_string(),
            self.step.to_string(),
        ];
        for ds in self.sources.iter() {
            args.push(format!("DS:{}:GAUGE:{}:U:U", ds.name, self.heartbeat()));
        }
        args.push(format!("RRA:LAST:0.5:1:{}", self.day_rows()));
        args.push(format!(
            "RRA:LAST:0.5:{}:{}",
            self.long_term_pdp(),
            self.long_term_rows()
        ));
        args
    }
}
