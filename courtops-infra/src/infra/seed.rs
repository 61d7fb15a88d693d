//! Deterministic demo records so a fresh database exercises every tool.

use crate::infra::record_store::{RecordCounts, RecordStoreError, SqliteRecordStore};
use chrono::{DateTime, Duration, Utc};
use courtops_tools::records::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

const SEED: u64 = 42;
const CASES: i64 = 600;
const TICKETS: i64 = 150;
const DEVICES: i64 = 60;
const PATCHES: i64 = 30;
const HISTORY_DAYS: i64 = 180;

const DEFENDANT_LAST_NAMES: &[&str] = &[
    "Rodriguez", "Smith", "Nguyen", "Davis", "Garcia", "Martinez", "Johnson", "Williams",
    "Brown", "Jones", "Miller", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
];
const TRAFFIC_CHARGES: &[&str] = &[
    "Speeding > 15mph",
    "Speeding > 10mph",
    "Exp. Registration",
    "No Insurance",
];
const CODE_CHARGE: &str = "City Ordinance (Code Enforcement)";
const FINES: &[f64] = &[100.0, 150.0, 195.0, 215.0, 220.0, 250.0, 350.0, 1500.0];
const PAYMENTS: &[f64] = &[0.0, 50.0, 100.0, 150.0, 250.0, 300.0];

/// Known FTA/warrant cases: citation, defendant, charge, fine, days since hearing.
const FTA_CASES: &[(&str, &str, &str, f64, i64)] = &[
    ("E009901", "Rodriguez, J.", "Speeding > 15mph", 215.0, 120),
    ("E009902", "Nguyen, T.", "No Insurance", 350.0, 117),
    ("E009903", "Garcia, M.", "Speeding > 10mph", 220.0, 96),
    ("C002901", "Properties LLC", CODE_CHARGE, 1500.0, 160),
    ("E009904", "Smith, K.", "Exp. Registration", 150.0, 95),
    ("E009905", "Davis, R.", "Speeding > 10mph", 195.0, 100),
];

const CASE_STATUSES: &[CaseStatus] = &[
    CaseStatus::Open,
    CaseStatus::Pending,
    CaseStatus::Disposed,
    CaseStatus::Dismissed,
    CaseStatus::Deferred,
    CaseStatus::Warrant,
    CaseStatus::Fta,
    CaseStatus::Paid,
];
const TICKET_CATEGORIES: &[TicketCategory] = &[
    TicketCategory::Application,
    TicketCategory::Hardware,
    TicketCategory::Access,
];
const TICKET_PRIORITIES: &[TicketPriority] = &[
    TicketPriority::Low,
    TicketPriority::Medium,
    TicketPriority::High,
    TicketPriority::Critical,
];
const TICKET_STATUSES: &[TicketStatus] = &[
    TicketStatus::Open,
    TicketStatus::InProgress,
    TicketStatus::Resolved,
    TicketStatus::Closed,
];
const DEVICE_STATUSES: &[DeviceStatus] = &[
    DeviceStatus::InService,
    DeviceStatus::InRepair,
    DeviceStatus::Retired,
    DeviceStatus::Lost,
];
const CHANGE_REQUEST_STATUSES: &[ChangeRequestStatus] = &[
    ChangeRequestStatus::Draft,
    ChangeRequestStatus::UnderReview,
    ChangeRequestStatus::Approved,
    ChangeRequestStatus::Rejected,
    ChangeRequestStatus::Implemented,
];
const PATCH_STATUSES: &[PatchStatus] = &[
    PatchStatus::Requested,
    PatchStatus::Scheduled,
    PatchStatus::Tested,
    PatchStatus::Deployed,
    PatchStatus::Verified,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub seeded: bool,
    pub counts: RecordCounts,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

/// Seed the store relative to `now`. A populated store is left untouched
/// unless `force` is set, in which case it is cleared first.
pub fn seed_demo_data(
    store: &SqliteRecordStore,
    now: DateTime<Utc>,
    force: bool,
) -> Result<SeedOutcome, RecordStoreError> {
    let existing = store.counts()?;
    if !existing.is_empty() && !force {
        info!("Store already populated, skipping seed");
        return Ok(SeedOutcome {
            seeded: false,
            counts: existing,
        });
    }
    if force {
        store.clear()?;
    }

    let mut rng = StdRng::seed_from_u64(SEED);
    seed_cases(store, &mut rng, now)?;
    seed_tickets(store, &mut rng, now)?;
    seed_devices(store, &mut rng, now)?;
    seed_patches(store, &mut rng, now)?;
    seed_change_requests(store, &mut rng)?;

    let counts = store.counts()?;
    info!(
        "Seeded {} cases, {} tickets, {} devices, {} patches, {} change requests",
        counts.cases, counts.tickets, counts.devices, counts.patches, counts.change_requests
    );
    Ok(SeedOutcome {
        seeded: true,
        counts,
    })
}

fn seed_cases(
    store: &SqliteRecordStore,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<(), RecordStoreError> {
    let today = now.date_naive();
    let charge_count = TRAFFIC_CHARGES.len() + 2;

    for i in 0..CASES {
        let filing_date = today - Duration::days(rng.gen_range(0..=HISTORY_DAYS));
        let status = pick(rng, CASE_STATUSES);
        let delinquent = matches!(status, CaseStatus::Fta | CaseStatus::Warrant);
        let disposition_date =
            if matches!(status, CaseStatus::Disposed | CaseStatus::Dismissed | CaseStatus::Paid) {
                Some(filing_date + Duration::days(rng.gen_range(1..=90)))
            } else {
                None
            };

        let charge_idx = rng.gen_range(0..charge_count);
        let (charge_type, prefix, base) = if charge_idx < TRAFFIC_CHARGES.len() {
            (TRAFFIC_CHARGES[charge_idx], 'E', 4592)
        } else if charge_idx == TRAFFIC_CHARGES.len() {
            (CODE_CHARGE, 'C', 1124)
        } else {
            ("Parking", 'P', 2000)
        };

        let mut hearing_date = filing_date + Duration::days(rng.gen_range(7..=60));
        if delinquent && i % 12 == 0 {
            hearing_date = today - Duration::days(rng.gen_range(90..=180));
        }

        let fine_amount = pick(rng, FINES);
        let amount_paid = if delinquent {
            0.0
        } else if rng.gen_bool(1.0 / 7.0) {
            fine_amount
        } else {
            pick(rng, PAYMENTS)
        };

        let mut defendant = pick(rng, DEFENDANT_LAST_NAMES).to_string();
        if charge_type == CODE_CHARGE && rng.gen_bool(0.5) {
            defendant.push_str(" LLC");
        }
        let initial = char::from(b'A' + (i % 26) as u8);

        store.insert_case(&Case {
            id: 0,
            case_number: format!("{}{:06}", prefix, base + i),
            defendant_name: format!("{}, {}.", defendant, initial),
            charge_type: charge_type.to_string(),
            status,
            filing_date,
            hearing_date: Some(hearing_date),
            disposition_date,
            fine_amount,
            amount_paid,
        })?;
    }

    for (i, (citation, defendant, charge, fine, days_ago)) in FTA_CASES.iter().enumerate() {
        store.insert_case(&Case {
            id: 0,
            case_number: citation.to_string(),
            defendant_name: defendant.to_string(),
            charge_type: charge.to_string(),
            status: if i % 2 == 0 {
                CaseStatus::Fta
            } else {
                CaseStatus::Warrant
            },
            filing_date: today - Duration::days(days_ago + 30),
            hearing_date: Some(today - Duration::days(*days_ago)),
            disposition_date: None,
            fine_amount: *fine,
            amount_paid: 0.0,
        })?;
    }
    Ok(())
}

fn seed_tickets(
    store: &SqliteRecordStore,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<(), RecordStoreError> {
    for i in 0..TICKETS {
        let created_at = now - Duration::hours(rng.gen_range(0..=HISTORY_DAYS * 24));
        let category = pick(rng, TICKET_CATEGORIES);
        let status = pick(rng, TICKET_STATUSES);
        let label = serde_json::to_value(category)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let mut ticket = Ticket {
            id: 0,
            title: format!("{} issue {}", capitalize(&label), i),
            description: format!("Simulated {} ticket {}", label, i),
            category,
            priority: pick(rng, TICKET_PRIORITIES),
            status,
            created_at,
            due_at: None,
            resolved_at: None,
        };
        ticket.due_at = Some(ticket.due_from_sla());
        if !ticket.is_open() {
            ticket.resolved_at = Some(created_at + Duration::hours(rng.gen_range(1..=72)));
        }
        store.insert_ticket(&ticket)?;
    }
    Ok(())
}

fn seed_devices(
    store: &SqliteRecordStore,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<(), RecordStoreError> {
    let today = now.date_naive();
    for i in 0..DEVICES {
        store.insert_device(&Device {
            id: 0,
            asset_tag: format!("MC-{}", 1000 + i),
            device_type: pick(rng, &["Desktop", "Laptop", "Printer", "Scanner"]).to_string(),
            location: pick(rng, &["Clerk Office", "Courtroom 101", "Courtroom 201", "Records"])
                .to_string(),
            assigned_user: Some(
                pick(rng, &["Clerk A", "Clerk B", "Analyst", "IT Support"]).to_string(),
            ),
            warranty_end: Some(today + Duration::days(rng.gen_range(-180..=365))),
            last_patch_date: Some(today + Duration::days(rng.gen_range(-120..=0))),
            status: pick(rng, DEVICE_STATUSES),
        })?;
    }
    Ok(())
}

fn seed_patches(
    store: &SqliteRecordStore,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<(), RecordStoreError> {
    let today = now.date_naive();
    for i in 0..PATCHES {
        let requested = today - Duration::days(rng.gen_range(0..=120));
        let status = pick(rng, PATCH_STATUSES);
        let scheduled = requested + Duration::days(rng.gen_range(1..=14));
        let deployed = matches!(status, PatchStatus::Deployed | PatchStatus::Verified)
            .then(|| scheduled + Duration::days(rng.gen_range(1..=14)));
        let verified = if status == PatchStatus::Verified {
            deployed.map(|d| d + Duration::days(3))
        } else {
            None
        };

        store.insert_patch(&Patch {
            id: 0,
            title: format!("Patch {}", i),
            patch_type: if rng.gen_bool(0.5) {
                PatchType::Application
            } else {
                PatchType::Device
            },
            status,
            target_version: Some(pick(rng, &["v1.0.1", "v1.0.2", "v1.1.0"]).to_string()),
            device_asset_tag: None,
            requested_date: requested,
            scheduled_date: Some(scheduled),
            deployed_date: deployed,
            verified_date: verified,
        })?;
    }
    Ok(())
}

fn seed_change_requests(store: &SqliteRecordStore, rng: &mut StdRng) -> Result<(), RecordStoreError> {
    let titles = [
        "Online payment workflow enhancement",
        "Improve docket scheduling notifications",
        "Add reporting field for compliance review",
    ];
    for title in titles {
        let request = NewChangeRequest {
            title: title.to_string(),
            requested_by: pick(rng, &["Clerk A", "Judge Garcia", "Court Manager"]).to_string(),
            current_process: "Current process is documented as manual steps across spreadsheets."
                .into(),
            proposed_change: "Automate the workflow within the CourtOps application.".into(),
            impact_users: "Clerks, supervisors, and IT support.".into(),
            impact_data: "Case records, payment records, scheduling data.".into(),
            impact_security: "Requires role-based restrictions and audit logging.".into(),
        };
        store.insert_change_request(&request, pick(rng, CHANGE_REQUEST_STATUSES))?;
    }
    Ok(())
}
