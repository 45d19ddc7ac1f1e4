//! MessagePack file-backed challenge store.
//!
//! The whole [`StoreSnapshot`] lives in one file encoded with rmp_serde. Each
//! commit reads the file, applies the change in memory and replaces the file
//! through a temporary sibling and a rename.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use super::snapshot::StoreSnapshot;
use crate::{
    Result,
    activity::StepRecord,
    assistant::{ChallengeUpdate, ScheduleDecision},
    challenge::Challenge,
    error::Error,
    ports::ChallengeStore,
};

/// Store backed by a single MessagePack file.
///
/// # Examples
///
/// ```no_run
/// use nudge::adapters::{MsgPackStore, StoreSnapshot};
/// use nudge::ports::ChallengeStore;
///
/// let store = MsgPackStore::new("store.msgpack");
/// store.save(&StoreSnapshot::default())?;
/// assert!(store.challenges("alice").is_err());
/// # Ok::<(), nudge::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MsgPackStore {
    path: PathBuf,
}

impl MsgPackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole store file.
    pub fn load(&self) -> Result<StoreSnapshot> {
        let file = File::open(&self.path).map_err(|source| Error::Io {
            operation: format!("open store file {:?}", self.path),
            source,
        })?;
        rmp_serde::decode::from_read(file).map_err(|e| Error::SerializationContext {
            operation: "deserialize store from MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    /// Replace the store file with `snapshot`.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let tmp = self.path.with_extension("msgpack.tmp");
        {
            let file = File::create(&tmp).map_err(|source| Error::Io {
                operation: format!("create file {tmp:?}"),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            rmp_serde::encode::write(&mut writer, snapshot).map_err(|e| {
                Error::SerializationContext {
                    operation: "serialize store to MessagePack".to_string(),
                    message: e.to_string(),
                }
            })?;
            writer.into_inner().map_err(|e| Error::Io {
                operation: format!("flush {tmp:?}"),
                source: e.into_error(),
            })?;
        }
        fs::rename(&tmp, &self.path).map_err(|source| Error::Io {
            operation: format!("replace store file {:?}", self.path),
            source,
        })
    }
}

impl ChallengeStore for MsgPackStore {
    fn challenges(&self, user: &str) -> Result<Vec<Challenge>> {
        Ok(self.load()?.user(user)?.challenges.clone())
    }

    fn step_records(&self, user: &str) -> Result<Vec<StepRecord>> {
        Ok(self.load()?.user(user)?.step_records.clone())
    }

    fn decision(&self, user: &str, date: NaiveDate) -> Result<Option<ScheduleDecision>> {
        Ok(self.load()?.user(user)?.decisions.get(&date).cloned())
    }

    fn commit_schedule(
        &self,
        decision: &ScheduleDecision,
        updates: &[ChallengeUpdate],
    ) -> Result<()> {
        let mut snapshot = self.load()?;
        snapshot.commit(decision, updates)?;
        self.save(&snapshot)
    }
}
