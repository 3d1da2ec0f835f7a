use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Offline,
}

/// Online/offline detection for a data source.
/// The source is declared offline once more than `max_failed`
/// consecutive updates have failed.
#[derive(Debug)]
pub struct NodeStatus {
    label: &'static str,
    online: bool,
    failed: u32,
    max_failed: u32,
}

impl NodeStatus {
    pub fn new(label: &'static str, max_failed: u32) -> Self {
        Self {
            label,
            online: true,
            failed: 0,
            max_failed,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Records the outcome of one update. Returns `Status::Offline` for
    /// every failure past the threshold, so callers can keep downstream
    /// clients informed; the transition itself is logged once.
    pub fn record(&mut self, success: bool) -> Status {
        if success {
            self.failed = 0;
            if !self.online {
                info!("{} online", self.label);
                self.online = true;
            }
        } else {
            self.failed = self.failed.saturating_add(1);
        }
        if self.failed > self.max_failed {
            if self.online {
                info!("{} offline", self.label);
            }
            self.online = false;
            return Status::Offline;
        }
        Status::Online
    }
}
