use std::path::PathBuf;
use std::time::Duration;

use crate::features::JoinPolicy;

pub const DEFAULT_DATA_PATH: &str = "data/Data Analyst Faceoff Project Data.xlsx";
pub const DEFAULT_EVENTS_SHEET: &str = "NHLFaceOffs";
pub const DEFAULT_PLAYERS_SHEET: &str = "PlayerInfo";
pub const DEFAULT_TEAMCODES_PATH: &str = "data/nhl_teamcodes.csv";
pub const DEFAULT_TEAM: &str = "Nashville Predators";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub events_sheet: String,
    pub players_sheet: String,
    pub teamcodes_path: PathBuf,
    pub default_team: String,
    pub cache_ttl: Duration,
    pub export_dir: PathBuf,
    pub join_policy: JoinPolicy,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            events_sheet: DEFAULT_EVENTS_SHEET.to_string(),
            players_sheet: DEFAULT_PLAYERS_SHEET.to_string(),
            teamcodes_path: PathBuf::from(DEFAULT_TEAMCODES_PATH),
            default_team: DEFAULT_TEAM.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            export_dir: PathBuf::from("exports"),
            join_policy: JoinPolicy::DropUnmatched,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads `FACEOFF_*` variables; call after the dotenv files are loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_ttl = text("FACEOFF_CACHE_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(defaults.cache_ttl);
        let join_policy = text("FACEOFF_JOIN_POLICY")
            .and_then(|v| JoinPolicy::parse(&v))
            .unwrap_or(defaults.join_policy);

        Self {
            data_path: text("FACEOFF_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            events_sheet: text("FACEOFF_EVENTS_SHEET").unwrap_or(defaults.events_sheet),
            players_sheet: text("FACEOFF_PLAYERS_SHEET").unwrap_or(defaults.players_sheet),
            teamcodes_path: text("FACEOFF_TEAMCODES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.teamcodes_path),
            default_team: text("FACEOFF_DEFAULT_TEAM").unwrap_or(defaults.default_team),
            cache_ttl,
            export_dir: text("FACEOFF_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            join_policy,
            log_file: text("FACEOFF_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn lookup_overrides_and_falls_back() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("FACEOFF_CACHE_TTL_SECS", "30"),
            ("FACEOFF_JOIN_POLICY", "reject"),
            ("FACEOFF_DEFAULT_TEAM", "  "),
            ("FACEOFF_EVENTS_SHEET", "Events"),
        ]);
        let cfg = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(30));
        assert_eq!(cfg.join_policy, JoinPolicy::Reject);
        assert_eq!(cfg.default_team, DEFAULT_TEAM);
        assert_eq!(cfg.events_sheet, "Events");
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn bad_ttl_uses_default() {
        let cfg = AppConfig::from_lookup(|k| {
            (k == "FACEOFF_CACHE_TTL_SECS").then(|| "soon".to_string())
        });
        assert_eq!(cfg.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    }
}
