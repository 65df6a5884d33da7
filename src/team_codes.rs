use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, Deserialize)]
struct TeamCodeRow {
    #[serde(rename = "TeamName")]
    team_name: String,
    #[serde(rename = "TeamCode")]
    team_code: String,
}

/// Display name <-> short code lookup, in file order.
#[derive(Debug, Clone, Default)]
pub struct TeamCodes {
    entries: Vec<(String, String)>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl TeamCodes {
    pub fn from_pairs<N, C>(pairs: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        let mut out = Self::default();
        for (name, code) in pairs {
            out.insert(name.into(), code.into());
        }
        out
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open team codes {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("parse team codes {}", path.display()))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut out = Self::default();
        for row in rdr.deserialize::<TeamCodeRow>() {
            let row = row.context("team code row")?;
            out.insert(row.team_name, row.team_code);
        }
        Ok(out)
    }

    fn insert(&mut self, name: String, code: String) {
        let name = name.trim().to_string();
        let code = code.trim().to_string();
        if self.by_name.contains_key(&name) {
            return;
        }
        let idx = self.entries.len();
        self.by_name.insert(name.clone(), idx);
        self.by_code.entry(code.clone()).or_insert(idx);
        self.entries.push((name, code));
    }

    pub fn resolve(&self, name: &str) -> Result<&str, PipelineError> {
        self.by_name
            .get(name.trim())
            .map(|&idx| self.entries[idx].1.as_str())
            .ok_or_else(|| PipelineError::UnresolvableTeam {
                name: name.to_string(),
            })
    }

    pub fn name_for_code(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(code)
            .map(|&idx| self.entries[idx].0.as_str())
    }

    /// Accepts either a code or a display name.
    pub fn lookup(&self, name_or_code: &str) -> Option<&str> {
        let key = name_or_code.trim();
        if let Some(&idx) = self.by_code.get(key) {
            return Some(self.entries[idx].1.as_str());
        }
        self.resolve(key).ok()
    }

    /// Distinct codes in file order.
    pub fn distinct_codes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.entries.len());
        for code in self.codes() {
            if !out.iter().any(|c| c == code) {
                out.push(code.to_string());
            }
        }
        out
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, code)| code.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logo URL for a team code on the league asset host.
pub fn team_logo_url(code: &str) -> String {
    format!("https://assets.nhle.com/logos/nhl/svg/{code}_dark.svg")
}
