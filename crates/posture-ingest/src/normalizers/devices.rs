//! Endpoint inventory rows

use super::{resolve_device, RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{DiagnosticKind, Entity, Identifier, SourceKind};

/// Endpoint inventory (one row per device)
///
/// Identity is the serial number; rows without one fall back to the device
/// name and then to the unknown-device sentinel. Such rows are kept so the
/// device still counts toward coverage denominators.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceNormalizer;

impl SourceNormalizer for DeviceNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Devices
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let (id, note) = resolve_device(row);
        let mut device = Entity::device(id, row.period);

        if let Some(name) = row.text(CanonicalField::DeviceName) {
            device = device.with_display_name(name);
        }
        if let Some(owner) = row.text(CanonicalField::Owner).and_then(|raw| owner_email(&raw)) {
            device = device.with_owner(owner);
        }

        let output = RowOutput::entity(device);
        Ok(match note {
            Some(detail) => output.with_note(DiagnosticKind::UnresolvedDevice, detail),
            None => output,
        })
    }
}

/// Owner email from `DOMAIN\user@x` or plain `user@x`
///
/// Only the text after the last backslash is considered, and only when it
/// looks like an email.
fn owner_email(raw: &str) -> Option<Identifier> {
    let candidate = raw.rsplit('\\').next().unwrap_or(raw);
    if candidate.contains('@') {
        Identifier::email(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::normalize;
    use crate::record::RawRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn owner_email_forms() {
        assert_eq!(owner_email(r"CORP\Ann@corp.io").unwrap().as_str(), "ann@corp.io");
        assert_eq!(owner_email("bob@corp.io").unwrap().as_str(), "bob@corp.io");
        assert!(owner_email(r"CORP\ann").is_none());
    }

    #[test]
    fn device_with_serial_and_owner() {
        let rows = vec![RawRecord::new()
            .with("Serial Number", "pf3a 9k")
            .with("Device Name", "FIN-LT-07")
            .with("Last User", r"CORP\ann@corp.io")];
        let out = normalize(&rows, SourceKind::Devices, "2025-11".parse().unwrap());

        let device = &out.entities[0];
        assert_eq!(device.id.as_str(), "PF3A9K");
        assert_eq!(device.display_name.as_deref(), Some("FIN-LT-07"));
        assert_eq!(device.owner.as_ref().map(Identifier::as_str), Some("ann@corp.io"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn missing_serial_falls_back_to_name_then_sentinel() {
        let rows = vec![
            RawRecord::new().with("Computer Name", "kiosk-2"),
            RawRecord::new().with("Serial", "").with("Notes", "spare"),
        ];
        let out = normalize(&rows, SourceKind::Devices, "2025-11".parse().unwrap());

        let ids: Vec<&str> = out.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["DN:KIOSK-2", "UNKNOWN-DEVICE#devices-1"]);
        assert_eq!(out.diagnostics.len(), 2);
        assert!(out
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnresolvedDevice));
        assert_eq!(out.skipped_rows(), 0);
        assert_eq!(
            out.diagnostics[0].detail,
            "no serial number column; identified by device name as DN:KIOSK-2"
        );
        assert_eq!(out.diagnostics[1].detail, "blank serial number and no device name");
    }
}
