//! Where unsolicited messages (reports) go.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// File holding the first observed conversation id, inside the data directory.
pub const DESTINATION_FILE: &str = "destination";

/// First-observed conversation id. Once set it never changes.
#[derive(Debug, Default)]
pub struct Destination {
    cell: OnceLock<String>,
    path: Option<PathBuf>,
}

impl Destination {
    /// In-memory destination pre-seeded with `seed` unless it is blank.
    pub fn new(seed: &str) -> Self {
        let destination = Self::default();
        destination.seed(seed);
        destination
    }

    /// Destination persisted at `{data_dir}/destination`. A non-blank `seed`
    /// wins over the recorded value.
    pub fn open(data_dir: &Path, seed: &str) -> Self {
        let path = data_dir.join(DESTINATION_FILE);
        let destination = Self {
            cell: OnceLock::new(),
            path: Some(path.clone()),
        };
        destination.seed(seed);
        match std::fs::read_to_string(&path) {
            Ok(recorded) => destination.seed(&recorded),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no destination recorded at {}", path.display());
            }
            Err(e) => warn!("failed to read {}: {e}", path.display()),
        }
        destination
    }

    /// Record `conversation_id` if nothing is recorded yet.
    pub fn observe(&self, conversation_id: &str) {
        if conversation_id.is_empty() || self.cell.get().is_some() {
            return;
        }
        if self.cell.set(conversation_id.to_string()).is_ok() {
            info!("destination set to {conversation_id}");
            self.save(conversation_id);
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.cell.get().map(String::as_str)
    }

    fn seed(&self, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            let _ = self.cell.set(value.to_string());
        }
    }

    fn save(&self, conversation_id: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = std::fs::write(path, conversation_id) {
            warn!("failed to record destination in {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observed_wins() {
        let dest = Destination::new("");
        assert!(dest.get().is_none());
        dest.observe("");
        assert!(dest.get().is_none());
        dest.observe("g1");
        dest.observe("g2");
        assert_eq!(dest.get(), Some("g1"));
    }

    #[test]
    fn test_seed_takes_precedence() {
        let dest = Destination::new(" g0 ");
        dest.observe("g1");
        assert_eq!(dest.get(), Some("g0"));
    }

    #[test]
    fn test_observed_destination_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let dest = Destination::open(dir.path(), "");
            assert!(dest.get().is_none());
            dest.observe("g1");
        }
        let dest = Destination::open(dir.path(), "");
        assert_eq!(dest.get(), Some("g1"));
        dest.observe("g2");
        assert_eq!(
            std::fs::read_to_string(dir.path().join(DESTINATION_FILE)).unwrap(),
            "g1"
        );
    }

    #[test]
    fn test_configured_seed_beats_recorded_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESTINATION_FILE), "g1\n").unwrap();
        assert_eq!(Destination::open(dir.path(), "g9").get(), Some("g9"));
        assert_eq!(Destination::open(dir.path(), "").get(), Some("g1"));
    }
}
