// src/backup/rotation.rs

//! Monthly repository naming.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::config::ConfigFile;

/// `<prefix>-<month>-<year>`, month not zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub prefix: String,
    pub month: u32,
    pub year: i32,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.prefix, self.month, self.year)
    }
}

/// Computes which repository is live and which one has aged out.
///
/// Nothing is persisted: both names are derived from the date on every call.
#[derive(Debug, Clone)]
pub struct Rotation {
    root: PathBuf,
    prefix: String,
    retention_months: u32,
}

impl Rotation {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, retention_months: u32) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            retention_months,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            cfg.paths.backup_root.clone(),
            cfg.paths.repo_prefix.clone(),
            cfg.retention.months,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention_months(&self) -> u32 {
        self.retention_months
    }

    pub fn repo_id(&self, date: NaiveDate) -> RepoId {
        RepoId {
            prefix: self.prefix.clone(),
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn current_id(&self, today: NaiveDate) -> RepoId {
        self.repo_id(today)
    }

    pub fn expired_id(&self, today: NaiveDate) -> RepoId {
        self.repo_id(months_before(today, self.retention_months))
    }

    pub fn current_repo(&self, today: NaiveDate) -> PathBuf {
        self.root.join(self.current_id(today).to_string())
    }

    pub fn expired_repo(&self, today: NaiveDate) -> PathBuf {
        self.root.join(self.expired_id(today).to_string())
    }

    /// Whether a directory name under the root looks like one of ours.
    pub fn parse_repo_name(&self, name: &str) -> Option<RepoId> {
        let rest = name.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (month, year) = rest.split_once('-')?;
        let month: u32 = month.parse().ok()?;
        let year: i32 = year.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(RepoId {
            prefix: self.prefix.clone(),
            month,
            year,
        })
    }
}

/// First day of the month `months` calendar months before `date`'s month.
///
/// Anchoring on the first of the month keeps the day of month out of the
/// result: 30 April minus two months is February, never early March.
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    let month_start = date - Days::new(u64::from(date.day0()));
    month_start
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
