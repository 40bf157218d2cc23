use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Composite identity of one attendance cell: one bowler, one league, one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub bowler_id: u64,
    pub league_id: u64,
    pub week_number: u32,
}

impl CellKey {
    pub fn new(bowler_id: u64, league_id: u64, week_number: u32) -> Self {
        Self {
            bowler_id,
            league_id,
            week_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    #[default]
    None,
    Paid,
    Missed,
    Fixed,
}

impl CellStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CellStatus::None => "none",
            CellStatus::Paid => "paid",
            CellStatus::Missed => "missed",
            CellStatus::Fixed => "fixed",
        }
    }

    /// Lenient parse for server-rendered markup; anything unknown reads as `None`.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "paid" => CellStatus::Paid,
            "missed" => CellStatus::Missed,
            "fixed" => CellStatus::Fixed,
            _ => CellStatus::None,
        }
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /attendance/update`. `amount` travels only for edit-mode commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub bowler_id: u64,
    pub league_id: u64,
    pub week_number: u32,
    pub status: CellStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    pub start_date: NaiveDate,
    pub weeks: u32,
    pub social_fee: f64,
    pub has_fines: bool,
    pub fine_amount: f64,
    pub roster: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bowler {
    pub name: String,
    #[serde(default)]
    pub tba_number: Option<String>,
    #[serde(default = "Bowler::default_tba_status")]
    pub tba_status: String,
    #[serde(default)]
    pub tba_last_checked: Option<String>,
}

impl Bowler {
    fn default_tba_status() -> String {
        "pending".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub bowler_id: u64,
    pub league_id: u64,
    pub week_number: u32,
    pub status: CellStatus,
    pub amount_paid: f64,
    pub fine_paid: bool,
}

impl AttendanceRecord {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.bowler_id, self.league_id, self.week_number)
    }
}

/// The whole persisted world: leagues, bowlers, and every attendance record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeagueBook {
    pub leagues: BTreeMap<u64, League>,
    pub bowlers: BTreeMap<u64, Bowler>,
    pub attendance: Vec<AttendanceRecord>,
}

impl LeagueBook {
    pub fn record(&self, key: CellKey) -> Option<&AttendanceRecord> {
        self.attendance.iter().find(|record| record.key() == key)
    }

    pub fn record_mut(&mut self, key: CellKey) -> Option<&mut AttendanceRecord> {
        self.attendance.iter_mut().find(|record| record.key() == key)
    }
}
