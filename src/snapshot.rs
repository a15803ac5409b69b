//! Intelligence snapshot — the four-field view handed to the transport layer.

use serde::{Deserialize, Serialize};

use crate::engine::{FieldKind, Session};

/// Committed artifact values for one session. Exactly four keys, each a
/// normalized string or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelligenceSnapshot {
    pub upi: Option<String>,
    pub bank_account: Option<String>,
    pub ifsc: Option<String>,
    pub link: Option<String>,
}

impl IntelligenceSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            upi: session.field(FieldKind::Upi).value.clone(),
            bank_account: session.field(FieldKind::BankAccount).value.clone(),
            ifsc: session.field(FieldKind::Ifsc).value.clone(),
            link: session.field(FieldKind::Link).value.clone(),
        }
    }

    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Upi => self.upi.as_deref(),
            FieldKind::BankAccount => self.bank_account.as_deref(),
            FieldKind::Ifsc => self.ifsc.as_deref(),
            FieldKind::Link => self.link.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        FieldKind::ALL.iter().all(|k| self.get(*k).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Session;

    #[test]
    fn empty_session_yields_all_null_snapshot() {
        let session = Session::new("s1");
        let snapshot = IntelligenceSnapshot::from_session(&session);
        assert!(snapshot.is_empty());
        let json = serde_json::to_value(&snapshot).unwrap();
        for key in ["upi", "bank_account", "ifsc", "link"] {
            assert!(json[key].is_null());
        }
    }

    #[test]
    fn committed_values_surface_under_wire_names() {
        let mut session = Session::new("s1");
        session.turn_count = 1;
        let record = session.field_mut(FieldKind::Ifsc);
        record.value = Some("SBIN0001234".to_string());
        record.canonical = Some("SBIN0001234".to_string());
        record.committed_turn = Some(1);
        let snapshot = IntelligenceSnapshot::from_session(&session);
        assert_eq!(snapshot.get(FieldKind::Ifsc), Some("SBIN0001234"));
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.get(FieldKind::Upi), None);
    }
}
