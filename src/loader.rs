use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::sheet::{RawFaceoff, RawPlayer, parse_raw_faceoffs, parse_raw_players, read_workbook};
use crate::team_codes::TeamCodes;

/// Everything read from disk for one dashboard run.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub team_codes: TeamCodes,
    pub faceoffs: Vec<RawFaceoff>,
    pub players: Vec<RawPlayer>,
}

/// Identity of one input file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl FileStamp {
    pub fn of(path: &Path) -> Result<Self> {
        let meta =
            std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: Vec<FileStamp>,
    loaded_at: Instant,
    data: Arc<Datasets>,
}

/// Reads the workbook and team code table, keeping the last result for `ttl`
/// as long as neither file changed on disk.
#[derive(Debug)]
pub struct DataLoader {
    data_path: PathBuf,
    events_sheet: String,
    players_sheet: String,
    teamcodes_path: PathBuf,
    ttl: Duration,
    cached: Option<CacheEntry>,
}

impl DataLoader {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            data_path: cfg.data_path.clone(),
            events_sheet: cfg.events_sheet.clone(),
            players_sheet: cfg.players_sheet.clone(),
            teamcodes_path: cfg.teamcodes_path.clone(),
            ttl: cfg.cache_ttl,
            cached: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn load(&mut self) -> Result<Arc<Datasets>> {
        let key = vec![
            FileStamp::of(&self.data_path)?,
            FileStamp::of(&self.teamcodes_path)?,
        ];
        let data_path = self.data_path.clone();
        let teamcodes_path = self.teamcodes_path.clone();
        let events_sheet = self.events_sheet.clone();
        let players_sheet = self.players_sheet.clone();
        self.get_or_load(key, Instant::now(), || {
            read_datasets(&data_path, &events_sheet, &players_sheet, &teamcodes_path)
        })
    }

    /// Cache lookup with an explicit key and clock; `read` runs only on a miss.
    pub fn get_or_load(
        &mut self,
        key: Vec<FileStamp>,
        now: Instant,
        read: impl FnOnce() -> Result<Datasets>,
    ) -> Result<Arc<Datasets>> {
        if let Some(entry) = &self.cached
            && entry.key == key
            && now.saturating_duration_since(entry.loaded_at) < self.ttl
        {
            return Ok(Arc::clone(&entry.data));
        }
        let data = Arc::new(read()?);
        tracing::info!(
            faceoffs = data.faceoffs.len(),
            players = data.players.len(),
            teams = data.team_codes.len(),
            "datasets loaded"
        );
        self.cached = Some(CacheEntry {
            key,
            loaded_at: now,
            data: Arc::clone(&data),
        });
        Ok(data)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}

pub fn read_datasets(
    data_path: &Path,
    events_sheet: &str,
    players_sheet: &str,
    teamcodes_path: &Path,
) -> Result<Datasets> {
    let team_codes = TeamCodes::load_csv(teamcodes_path)?;
    let (events, players) = read_workbook(data_path, events_sheet, players_sheet)?;
    let faceoffs = parse_raw_faceoffs(&events).context("parse faceoff sheet")?;
    let players = parse_raw_players(&players).context("parse player sheet")?;
    Ok(Datasets {
        team_codes,
        faceoffs,
        players,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn empty() -> Result<Datasets> {
        Ok(Datasets {
            team_codes: TeamCodes::default(),
            faceoffs: Vec::new(),
            players: Vec::new(),
        })
    }

    fn stamp(len: u64) -> Vec<FileStamp> {
        vec![FileStamp {
            path: PathBuf::from("book.xlsx"),
            modified: None,
            len,
        }]
    }

    #[test]
    fn cache_hits_until_ttl_or_key_change() {
        let mut loader = DataLoader::new(&AppConfig::default()).with_ttl(Duration::from_secs(60));
        let reads = Cell::new(0);
        let read = || {
            reads.set(reads.get() + 1);
            empty()
        };
        let t0 = Instant::now();

        loader.get_or_load(stamp(1), t0, read).unwrap();
        loader.get_or_load(stamp(1), t0 + Duration::from_secs(10), read).unwrap();
        assert_eq!(reads.get(), 1);

        loader.get_or_load(stamp(2), t0 + Duration::from_secs(11), read).unwrap();
        assert_eq!(reads.get(), 2);

        loader.get_or_load(stamp(2), t0 + Duration::from_secs(120), read).unwrap();
        assert_eq!(reads.get(), 3);

        loader.invalidate();
        assert!(!loader.is_cached());
        loader.get_or_load(stamp(2), t0 + Duration::from_secs(121), read).unwrap();
        assert_eq!(reads.get(), 4);
    }
}
