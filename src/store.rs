use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::Event;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Events persisted one per line as
/// `name,description,YYYY-MM-DD,YYYY-MM-DD[,done]`.
///
/// Every mutation is written back immediately.
#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    events: Vec<Event>,
}

impl EventStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<EventStore, StoreError> {
        let path = path.into();
        let events = match fs::read_to_string(&path) {
            Ok(text) => parse_events(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(path = %path.display(), events = events.len(), "opened event store");
        Ok(EventStore { path, events })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Append an event and return its 1-based position.
    pub fn add(&mut self, event: Event) -> Result<usize, StoreError> {
        self.events.push(event);
        if let Err(err) = self.save() {
            self.events.pop();
            return Err(err);
        }
        info!(position = self.events.len(), "added event");
        Ok(self.events.len())
    }

    /// Remove the event at the 1-based `position`.
    pub fn remove(&mut self, position: usize) -> Result<Event, StoreError> {
        let index = self.index_of(position)?;
        let event = self.events.remove(index);
        if let Err(err) = self.save() {
            self.events.insert(index, event);
            return Err(err);
        }
        info!(position, name = event.name(), "removed event");
        Ok(event)
    }

    /// Mark the event at the 1-based `position` as done.
    pub fn mark_done(&mut self, position: usize) -> Result<&Event, StoreError> {
        let index = self.index_of(position)?;
        let previous = self.events[index].clone();
        self.events[index].mark_done();
        if let Err(err) = self.save() {
            self.events[index] = previous;
            return Err(err);
        }
        info!(position, "marked event as done");
        Ok(&self.events[index])
    }

    fn index_of(&self, position: usize) -> Result<usize, StoreError> {
        if position == 0 || position > self.events.len() {
            return Err(StoreError::NoSuchEvent {
                position,
                count: self.events.len(),
            });
        }
        Ok(position - 1)
    }

    /// Rewrite the whole file through a sibling temporary file.
    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut text = String::new();
        for event in &self.events {
            text.push_str(&format_line(event));
            text.push('\n');
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Serialize one event as a store line, without the line break.
pub fn format_line(event: &Event) -> String {
    format!(
        "{},{},{},{},{}",
        event.name(),
        event.description(),
        event.starting_date().format(DATE_FORMAT),
        event.ending_date().format(DATE_FORMAT),
        event.is_done()
    )
}

/// Parse line `number` (1-based) of a store. The done flag is optional.
pub fn parse_line(number: usize, line: &str) -> Result<Event, StoreError> {
    let malformed = |reason: String| StoreError::Line {
        line: number,
        reason,
    };
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 4 && fields.len() != 5 {
        return Err(malformed(format!(
            "expected 4 or 5 comma separated fields, found {}",
            fields.len()
        )));
    }

    let starting_date = parse_date(fields[2]).map_err(malformed)?;
    let ending_date = parse_date(fields[3]).map_err(malformed)?;
    let done = match fields.get(4) {
        Some(flag) => parse_flag(flag).map_err(malformed)?,
        None => false,
    };

    let mut event = Event::new(fields[0], fields[1], starting_date, ending_date).map_err(
        |source| StoreError::Invalid {
            line: number,
            source,
        },
    )?;
    if done {
        event.mark_done();
    }
    Ok(event)
}

fn parse_events(text: &str) -> Result<Vec<Event>, StoreError> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        events.push(parse_line(index + 1, line)?);
    }
    Ok(events)
}

fn parse_date(field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(field.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date {:?}: {}", field, err))
}

fn parse_flag(field: &str) -> Result<bool, String> {
    match field.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(format!("invalid done flag {:?}", other)),
    }
}
