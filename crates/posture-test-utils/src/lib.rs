//! Testing utilities for the posture workspace
//!
//! Shared fixtures for raw rows, identifiers and snapshots.

#![allow(missing_docs)]

use posture_ingest::{RawRecord, SourceBatches};
use posture_model::{
    Entity, Event, EventKind, Identifier, Period, PeriodSnapshot, Severity, SnapshotBuilder,
    SourceKind,
};
use serde_json::json;

pub fn period(s: &str) -> Period {
    s.parse().unwrap()
}

pub fn email(s: &str) -> Identifier {
    Identifier::email(s).unwrap()
}

pub fn serial(s: &str) -> Identifier {
    Identifier::serial(s).unwrap()
}

pub fn user_row(address: &str) -> RawRecord {
    RawRecord::new()
        .with("Email Address", address)
        .with("Display Name", address.split('@').next().unwrap_or(address))
        .with("Sign-in allowed", "Yes")
}

pub fn device_row(serial_number: &str, owner: Option<&str>) -> RawRecord {
    let row = RawRecord::new()
        .with("Serial Number", serial_number)
        .with("Device Name", format!("LT-{serial_number}"));
    match owner {
        Some(owner) => row.with("Last User", format!(r"CORP\{owner}")),
        None => row,
    }
}

pub fn edr_row(serial_number: &str, severity: &str) -> RawRecord {
    RawRecord::new()
        .with("SN", serial_number)
        .with("Severity", severity)
}

pub fn phishing_row(address: &str, clicks: u32) -> RawRecord {
    RawRecord::new()
        .with("Email", address)
        .with("Clicked", json!(clicks))
}

pub fn backup_row(serial_number: &str, status: &str) -> RawRecord {
    RawRecord::new()
        .with("Serial", serial_number)
        .with("Backup Status", status)
}

pub fn dark_web_row(address: &str, severity: &str) -> RawRecord {
    RawRecord::new()
        .with("Email", address)
        .with("Risk Level", severity)
}

/// A small but complete month of raw exports
///
/// 3 users, 2 devices (both backed up, one failing), 3 incidents (one with
/// no subject and no severity, so dropped), 1 phishing click, 1 exposure.
pub fn sample_batches() -> SourceBatches {
    SourceBatches::new()
        .with(
            SourceKind::Users,
            vec![
                user_row("ann@corp.io"),
                user_row("bob@corp.io"),
                user_row("cy@corp.io"),
            ],
        )
        .with(
            SourceKind::Devices,
            vec![
                device_row("S-100", Some("ann@corp.io")),
                device_row("S-200", Some("bob@corp.io")),
            ],
        )
        .with(
            SourceKind::Edr,
            vec![
                edr_row("S-100", "High"),
                edr_row("S-200", "low"),
                RawRecord::new().with("Description", "orphan alert"),
            ],
        )
        .with(
            SourceKind::Phishing,
            vec![phishing_row("bob@corp.io", 1), phishing_row("cy@corp.io", 0)],
        )
        .with(
            SourceKind::Backup,
            vec![backup_row("S-100", "Completed"), backup_row("S-200", "Failed")],
        )
        .with(SourceKind::DarkWeb, vec![dark_web_row("ann@corp.io", "medium")])
}

/// Snapshot with the given users and devices and no events
pub fn snapshot(at: &str, users: &[&str], devices: &[&str]) -> PeriodSnapshot {
    snapshot_with_events(at, users, devices, Vec::new())
}

pub fn snapshot_with_events(
    at: &str,
    users: &[&str],
    devices: &[&str],
    events: Vec<Event>,
) -> PeriodSnapshot {
    let p = period(at);
    let mut builder = SnapshotBuilder::new(p);
    builder.extend_entities(users.iter().map(|u| Entity::user(email(u), p)));
    builder.extend_entities(devices.iter().map(|d| Entity::device(serial(d), p)));
    builder.extend_events(events);
    builder.build()
}

pub fn incident(at: &str, severity: &str) -> Event {
    Event::new(
        period(at),
        None,
        EventKind::EdrIncident {
            severity: Severity::parse(severity),
        },
    )
}
