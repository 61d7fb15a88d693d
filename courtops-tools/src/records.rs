//! Court operations records the tools read and mutate.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Application,
    Hardware,
    Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    /// SLA window in hours.
    pub fn sla_hours(self) -> i64 {
        match self {
            TicketPriority::Low => 72,
            TicketPriority::Medium => 48,
            TicketPriority::High => 24,
            TicketPriority::Critical => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        matches!(self.status, TicketStatus::Open | TicketStatus::InProgress)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) => self.is_open() && now > due,
            None => false,
        }
    }

    pub fn due_from_sla(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(self.priority.sla_hours())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    InService,
    InRepair,
    Retired,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub asset_tag: String,
    pub device_type: String,
    pub location: String,
    pub assigned_user: Option<String>,
    pub warranty_end: Option<NaiveDate>,
    pub last_patch_date: Option<NaiveDate>,
    pub status: DeviceStatus,
}

impl Device {
    pub fn warranty_expiring_within(&self, today: NaiveDate, days: i64) -> bool {
        self.warranty_end
            .map(|end| (end - today).num_days() <= days)
            .unwrap_or(false)
    }

    pub fn patch_age_days(&self, today: NaiveDate) -> Option<i64> {
        self.last_patch_date.map(|d| (today - d).num_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchType {
    Application,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Requested,
    Scheduled,
    Tested,
    Deployed,
    Verified,
}

impl PatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchStatus::Requested => "requested",
            PatchStatus::Scheduled => "scheduled",
            PatchStatus::Tested => "tested",
            PatchStatus::Deployed => "deployed",
            PatchStatus::Verified => "verified",
        }
    }
}

impl FromStr for PatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requested" => Ok(PatchStatus::Requested),
            "scheduled" => Ok(PatchStatus::Scheduled),
            "tested" => Ok(PatchStatus::Tested),
            "deployed" => Ok(PatchStatus::Deployed),
            "verified" => Ok(PatchStatus::Verified),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: i64,
    pub title: String,
    pub patch_type: PatchType,
    pub status: PatchStatus,
    pub target_version: Option<String>,
    pub device_asset_tag: Option<String>,
    pub requested_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub deployed_date: Option<NaiveDate>,
    pub verified_date: Option<NaiveDate>,
}

impl Patch {
    /// Move to `status`, stamping the deployed/verified dates.
    pub fn transition(&mut self, status: PatchStatus, today: NaiveDate) {
        self.status = status;
        if status == PatchStatus::Deployed && self.deployed_date.is_none() {
            self.deployed_date = Some(today);
        }
        if status == PatchStatus::Verified {
            self.verified_date = Some(today);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatch {
    pub title: String,
    pub patch_type: PatchType,
    pub target_version: Option<String>,
    pub device_asset_tag: Option<String>,
    pub requested_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: i64,
    pub title: String,
    pub requested_by: String,
    pub current_process: String,
    pub proposed_change: String,
    pub impact_users: String,
    pub impact_data: String,
    pub impact_security: String,
    pub status: ChangeRequestStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewChangeRequest {
    pub title: String,
    pub requested_by: String,
    pub current_process: String,
    pub proposed_change: String,
    pub impact_users: String,
    pub impact_data: String,
    pub impact_security: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    Pending,
    Disposed,
    Dismissed,
    Deferred,
    Warrant,
    Fta,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub case_number: String,
    pub defendant_name: String,
    pub charge_type: String,
    pub status: CaseStatus,
    pub filing_date: NaiveDate,
    pub hearing_date: Option<NaiveDate>,
    pub disposition_date: Option<NaiveDate>,
    pub fine_amount: f64,
    pub amount_paid: f64,
}

pub const GROUP_TRAFFIC: &str = "Traffic Violations (High Priority)";
pub const GROUP_ORDINANCE: &str = "City Ordinance (Code Enforcement)";
pub const GROUP_OTHER: &str = "Other";

impl Case {
    pub fn outstanding_balance(&self) -> f64 {
        (self.fine_amount - self.amount_paid).max(0.0)
    }

    /// Days past the hearing (or filing + 90 days) for FTA and warrant cases.
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if !matches!(self.status, CaseStatus::Fta | CaseStatus::Warrant) {
            return None;
        }
        let due = self
            .hearing_date
            .unwrap_or(self.filing_date + Duration::days(90));
        Some((today - due).num_days().max(0))
    }

    pub fn violation_group(&self) -> &'static str {
        let charge = self.charge_type.trim().to_lowercase();
        let traffic = ["speeding", "parking", "registration", "insurance", "traffic"];
        let ordinance = ["ordinance", "code enforcement", "properties"];
        if traffic.iter().any(|t| charge.contains(t)) {
            GROUP_TRAFFIC
        } else if ordinance.iter().any(|t| charge.contains(t)) {
            GROUP_ORDINANCE
        } else {
            GROUP_OTHER
        }
    }
}
