use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, ViewError};
use crate::messages::MessageEvent;
use crate::progress::deserialize_percentage;
use crate::step_tree::{StepStatus, StepUpdate, deserialize_status};

const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One collaborator event, decoded from a JSON line tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Step(StepEvent),
    Message(MessageEvent),
    Progress {
        percentage: f64,
    },
    TurnStarted {
        turn_id: String,
        #[serde(default)]
        agent_tag: Option<String>,
    },
    TurnFinished {
        turn_id: String,
    },
}

/// A step announcement or a partial update for a known step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepEvent {
    pub step_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<StepStatus>,
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl StepEvent {
    pub fn update(&self) -> StepUpdate {
        StepUpdate {
            status: self.status,
            percentage: self.percentage,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Stdin,
    File { path: PathBuf, follow: bool },
}

impl FeedSource {
    /// `-` selects stdin.
    pub fn from_arg(arg: &Path, follow: bool) -> Self {
        if arg.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File {
                path: arg.to_path_buf(),
                follow,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Event(FeedEvent),
    Ended { lines: usize, skipped: usize },
}

/// Parses one feed line. Blank lines yield `None`.
pub fn parse_feed_line(line: &str) -> Result<Option<FeedEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Reads a whole feed synchronously, skipping malformed lines.
pub fn read_feed<R: BufRead>(reader: R) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().map_while(io::Result::ok).enumerate() {
        if let Some(event) = decode_or_warn(idx + 1, &line) {
            events.push(event);
        }
    }
    events
}

pub fn open_feed_file(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| ViewError::io(path, err))
}

/// Background reader delivering feed events over a channel so the UI loop
/// never blocks on the collaborator.
pub struct FeedReader {
    event_tx: Sender<FeedItem>,
    event_rx: Receiver<FeedItem>,
    stop: Arc<AtomicBool>,
}

impl Default for FeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedReader {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            event_tx,
            event_rx,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self, source: FeedSource) -> Result<()> {
        let tx = self.event_tx.clone();
        let stop = self.stop.clone();
        match source {
            FeedSource::Stdin => {
                thread::spawn(move || pump(io::stdin().lock(), false, &tx, &stop));
            }
            FeedSource::File { path, follow } => {
                let reader = open_feed_file(&path)?;
                thread::spawn(move || pump(reader, follow, &tx, &stop));
            }
        }
        Ok(())
    }

    pub fn drain_events_limited(&self, max_events: usize) -> Vec<FeedItem> {
        let mut events = Vec::new();
        while events.len() < max_events {
            let Ok(event) = self.event_rx.try_recv() else {
                break;
            };
            events.push(event);
        }
        events
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for FeedReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pump<R: BufRead>(mut reader: R, follow: bool, tx: &Sender<FeedItem>, stop: &AtomicBool) {
    let mut lines = 0;
    let mut skipped = 0;
    let mut line = String::new();
    while !stop.load(Ordering::Relaxed) {
        match reader.read_line(&mut line) {
            Ok(0) if follow => thread::sleep(FOLLOW_POLL_INTERVAL),
            Ok(0) => break,
            // The writer is mid-line; keep the fragment and read the rest later.
            Ok(_) if follow && !line.ends_with('\n') => thread::sleep(FOLLOW_POLL_INTERVAL),
            Ok(_) => {
                lines += 1;
                match decode_or_warn(lines, &line) {
                    Some(event) => {
                        if tx.send(FeedItem::Event(event)).is_err() {
                            return;
                        }
                    }
                    None if !line.trim().is_empty() => skipped += 1,
                    None => {}
                }
                line.clear();
            }
            Err(err) => {
                warn!(error = %err, "feed read failed");
                break;
            }
        }
    }
    debug!(lines, skipped, "feed reader finished");
    let _ = tx.send(FeedItem::Ended { lines, skipped });
}

fn decode_or_warn(line_no: usize, line: &str) -> Option<FeedEvent> {
    match parse_feed_line(line) {
        Ok(event) => event,
        Err(err) => {
            warn!(line = line_no, error = %err, "skipping malformed feed line");
            None
        }
    }
}
