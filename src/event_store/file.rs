//! Backing file: one canonical event line per line, rewritten in full

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EventLogError, EventLogResult};
use crate::protocol::split_fields;
use crate::types::Event;

/// The file an [`EventStore`](super::EventStore) is persisted to
#[derive(Debug, Clone)]
pub struct EventFile {
    path: PathBuf,
}

impl EventFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all events in file order.
    ///
    /// A missing file is an empty log. Lines that do not parse are skipped.
    pub fn load(&self) -> EventLogResult<Vec<Event>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No event file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(EventLogError::LoadEvents {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|source| EventLogError::LoadEvents {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            match Event::from_fields(&split_fields(&line)) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(line = line_num + 1, error = %e, "Skipping unreadable event line");
                }
            }
        }

        Ok(events)
    }

    /// Replace the file contents with `events`, one canonical line each
    pub fn save(&self, events: &[Event]) -> EventLogResult<()> {
        let save_err = |source| EventLogError::SaveEvents {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(save_err)?;
            }
        }

        let mut content = String::new();
        for event in events {
            content.push_str(&event.to_line());
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(save_err)
    }
}
