use super::CoopStore;
use crate::error::CoopResult;
use crate::member::{Member, PaymentRecord};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

const MEMBER_COLUMNS: &str = "member_id, name, phone, join_date, willing_to_work,
    worker_name, worker_phone, payment_json, activities_json, payments_json,
    insurance_json";

/// Map one member row, degrading malformed JSON columns to defaults with a
/// warning. One corrupted tree must not fail a whole snapshot scan.
fn member_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    let member_id: String = row.get(0)?;
    Ok(Member {
        member_id: member_id.clone(),
        name: row.get(1)?,
        phone: row.get(2)?,
        join_date: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| s.parse::<NaiveDate>().ok()),
        willing_to_work: row.get(4)?,
        worker_name: row.get(5)?,
        worker_phone: row.get(6)?,
        payment: parse_json_column(&member_id, "payment", row.get_ref(7)?),
        activities: parse_tree_column(&member_id, "activities", row.get_ref(8)?),
        payments: parse_tree_column(&member_id, "payments", row.get_ref(9)?),
        insurance: parse_json_column(&member_id, "insurance", row.get_ref(10)?),
    })
}

fn column_text(value: rusqlite::types::ValueRef<'_>) -> Option<&str> {
    match value {
        rusqlite::types::ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok(),
        _ => None,
    }
}

fn parse_json_column<T: serde::de::DeserializeOwned + Default>(
    member_id: &str,
    column: &str,
    value: rusqlite::types::ValueRef<'_>,
) -> T {
    let Some(text) = column_text(value) else {
        return T::default();
    };
    serde_json::from_str(text).unwrap_or_else(|e| {
        log::warn!("Member {member_id}: malformed {column} column ({e}); using defaults");
        T::default()
    })
}

fn parse_tree_column(member_id: &str, column: &str, value: rusqlite::types::ValueRef<'_>) -> Value {
    let Some(text) = column_text(value) else {
        return Value::Object(serde_json::Map::new());
    };
    serde_json::from_str(text).unwrap_or_else(|e| {
        log::warn!("Member {member_id}: malformed {column} tree ({e}); treating as empty");
        Value::Object(serde_json::Map::new())
    })
}

impl CoopStore {
    // ── Member ─────────────────────────────────────────────────────

    pub fn insert_member(&self, m: &Member, now: &str) -> CoopResult<()> {
        self.conn().execute(
            "INSERT INTO member (
                member_id, name, phone, join_date, willing_to_work,
                worker_name, worker_phone, payment_json, activities_json,
                payments_json, insurance_json, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &m.member_id,
                &m.name,
                m.phone.as_deref(),
                m.join_date.map(|d| d.to_string()),
                &m.willing_to_work,
                m.worker_name.as_deref(),
                m.worker_phone.as_deref(),
                serde_json::to_string(&m.payment)?,
                serde_json::to_string(&m.activities)?,
                serde_json::to_string(&m.payments)?,
                serde_json::to_string(&m.insurance)?,
                now,
                now,
            ],
        )?;
        Ok(())
    }

    /// Point-in-time snapshot of the full member collection. Report builds
    /// read exactly one of these.
    pub fn all_members(&self) -> CoopResult<Vec<Member>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member ORDER BY member_id ASC"
        ))?;
        let rows = stmt.query_map([], member_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_member(&self, member_id: &str) -> CoopResult<Option<Member>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member WHERE member_id = ?1"
        ))?;
        stmt.query_row(params![member_id], member_row_mapper)
            .optional()
            .map_err(Into::into)
    }

    /// The member half of the refund transition: flips the payment record
    /// to refunded with date and amount, preserving its other fields.
    pub fn mark_member_refunded(
        &self,
        member_id: &str,
        refund_date: NaiveDate,
        amount: f64,
    ) -> CoopResult<()> {
        let payment_json: String = self.conn().query_row(
            "SELECT payment_json FROM member WHERE member_id = ?1",
            params![member_id],
            |row| row.get(0),
        )?;
        let mut payment: PaymentRecord = serde_json::from_str(&payment_json).unwrap_or_else(|e| {
            log::warn!("Member {member_id}: malformed payment column ({e}); rebuilding");
            PaymentRecord::default()
        });
        payment.refunded = true;
        payment.refund_date = Some(refund_date);
        payment.refund_amount = Some(amount);

        self.conn().execute(
            "UPDATE member SET payment_json = ?1, updated_at = ?2 WHERE member_id = ?3",
            params![
                serde_json::to_string(&payment)?,
                refund_date.to_string(),
                member_id
            ],
        )?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────────

    pub fn member_count(&self) -> CoopResult<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM member", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn refunded_member_count(&self) -> CoopResult<i64> {
        let members = self.all_members()?;
        Ok(members.iter().filter(|m| m.payment.refunded).count() as i64)
    }

    /// Overwrite a member's activities column with non-JSON text. Tests use
    /// it to exercise the degrade-to-defaults path of the snapshot scan.
    pub fn corrupt_member_activities(&self, member_id: &str) -> CoopResult<()> {
        self.conn().execute(
            "UPDATE member SET activities_json = 'not json at all' WHERE member_id = ?1",
            params![member_id],
        )?;
        Ok(())
    }
}
