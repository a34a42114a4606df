//! Committed months and their reconciliation against what was billed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

use crate::models::{parse_amount, round2, InputError, MonthInvoice, MonthSummary};

/// Differences up to one cent are rounding noise
pub const VARIANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Outcome of comparing the invoiced amount with the calculated one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    NoDifference,
    OverInvoiced(Decimal),
    UnderInvoiced(Decimal),
}

impl Variance {
    pub fn from_amount(diff: Decimal) -> Self {
        if diff.abs() <= VARIANCE_TOLERANCE {
            Variance::NoDifference
        } else if diff.is_sign_positive() {
            Variance::OverInvoiced(diff)
        } else {
            Variance::UnderInvoiced(diff)
        }
    }

    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Variance::NoDifference)
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variance::NoDifference => write!(f, "no difference"),
            Variance::OverInvoiced(diff) => write!(f, "+{:.2} (over-invoiced)", diff),
            Variance::UnderInvoiced(diff) => write!(f, "{:.2} (under-invoiced)", diff),
        }
    }
}

/// `invoiced - calculated`, rounded to cents
pub fn variance(invoice: &MonthInvoice) -> Decimal {
    round2(invoice.invoiced_amount - invoice.calculated_amount)
}

pub fn classify(invoice: &MonthInvoice) -> Variance {
    Variance::from_amount(variance(invoice))
}

/// Variance of a typed amount against a live summary, for display while the
/// user is still editing. None when the text is blank or not a valid amount.
pub fn preview_variance(input: &str, summary: &MonthSummary) -> Option<Variance> {
    if input.trim().is_empty() {
        return None;
    }
    let amount = parse_amount(input).ok()?;
    Some(Variance::from_amount(round2(amount - summary.total_amount)))
}

/// Snapshot a month for commit. A blank `invoiced_input` means the daycare
/// billed exactly the calculated amount.
pub fn commit_month(
    year: i32,
    month0: u32,
    summary: &MonthSummary,
    invoiced_input: &str,
    comment: &str,
    saved_at: DateTime<Utc>,
) -> Result<MonthInvoice, InputError> {
    let invoiced_amount = if invoiced_input.trim().is_empty() {
        summary.total_amount
    } else {
        parse_amount(invoiced_input)?
    };
    Ok(MonthInvoice::new(
        year,
        month0,
        summary,
        invoiced_amount,
        comment.trim().to_string(),
        saved_at,
    ))
}

/// Month invoices, at most one per `YYYY-MM` key, kept in ascending key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceStore {
    invoices: Vec<MonthInvoice>,
}

impl InvoiceStore {
    /// Build a store from persisted records. Duplicate keys keep the last one;
    /// records whose month does not fit their key are skipped.
    pub fn from_records(records: Vec<MonthInvoice>) -> Self {
        let mut store = Self::default();
        for invoice in records {
            if !invoice.is_consistent() {
                tracing::warn!(
                    key = %invoice.key,
                    year = invoice.year,
                    month = invoice.month,
                    "Skipping stored invoice with an invalid month"
                );
                continue;
            }
            store.upsert(invoice);
        }
        store
    }

    /// Insert, or replace the record for the same month entirely
    pub fn upsert(&mut self, invoice: MonthInvoice) {
        match self.invoices.iter_mut().find(|existing| existing.key == invoice.key) {
            Some(existing) => *existing = invoice,
            None => self.invoices.push(invoice),
        }
        // "YYYY-MM" sorts chronologically as text
        self.invoices.sort_by(|a, b| a.key.cmp(&b.key));
    }

    pub fn find(&self, key: &str) -> Option<&MonthInvoice> {
        self.invoices.iter().find(|invoice| invoice.key == key)
    }

    /// Oldest month first
    pub fn list(&self) -> &[MonthInvoice] {
        &self.invoices
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn summary(days: u32, hours: Decimal, amount: Decimal) -> MonthSummary {
        MonthSummary { total_days: days, total_hours: hours, total_amount: amount }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0).unwrap()
    }

    fn invoice(year: i32, month0: u32, invoiced: &str) -> MonthInvoice {
        commit_month(year, month0, &summary(1, dec!(9), dec!(28.80)), invoiced, "", at(1)).unwrap()
    }

    #[test]
    fn tolerance_is_one_cent() {
        assert_eq!(VARIANCE_TOLERANCE, dec!(0.01));
    }

    #[test]
    fn over_invoiced_month() {
        let inv = invoice(2024, 2, "30.00");
        assert_eq!(inv.key, "2024-03");
        assert_eq!(variance(&inv), dec!(1.20));
        assert_eq!(classify(&inv), Variance::OverInvoiced(dec!(1.20)));
        assert_eq!(classify(&inv).to_string(), "+1.20 (over-invoiced)");
    }

    #[test]
    fn under_invoiced_month() {
        let inv = invoice(2024, 2, "27");
        assert_eq!(classify(&inv), Variance::UnderInvoiced(dec!(-1.80)));
    }

    #[test]
    fn one_cent_is_no_difference() {
        assert_eq!(classify(&invoice(2024, 2, "28.81")), Variance::NoDifference);
        assert_eq!(classify(&invoice(2024, 2, "28.79")), Variance::NoDifference);
        assert!(classify(&invoice(2024, 2, "28.82")).is_meaningful());
    }

    #[test]
    fn blank_amount_defaults_to_calculated() {
        let inv = invoice(2024, 2, "  ");
        assert_eq!(inv.invoiced_amount, dec!(28.80));
        assert_eq!(classify(&inv), Variance::NoDifference);
    }

    #[test]
    fn invalid_amount_is_rejected() {
        let s = summary(1, dec!(9), dec!(28.80));
        assert!(commit_month(2024, 2, &s, "lots", "", at(1)).is_err());
        assert!(commit_month(2024, 2, &s, "-5", "", at(1)).is_err());
    }

    #[test]
    fn commit_snapshots_the_summary() {
        let s = summary(12, dec!(108), dec!(345.60));
        let inv = commit_month(2024, 0, &s, "350", " paid late ", at(2)).unwrap();
        assert_eq!(inv.key, "2024-01");
        assert_eq!(inv.month, 0);
        assert_eq!(inv.calculated_days, 12);
        assert_eq!(inv.calculated_hours, dec!(108));
        assert_eq!(inv.calculated_amount, dec!(345.60));
        assert_eq!(inv.comment, "paid late");
        assert_eq!(inv.saved_at, at(2));
    }

    #[test]
    fn committing_twice_keeps_one_record() {
        let mut store = InvoiceStore::default();
        store.upsert(invoice(2024, 2, "30"));
        store.upsert(invoice(2024, 2, "30"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn recommit_replaces_the_whole_record() {
        let mut store = InvoiceStore::default();
        store.upsert(invoice(2024, 2, "30"));
        let newer = commit_month(2024, 2, &summary(2, dec!(18), dec!(57.60)), "", "redo", at(3)).unwrap();
        store.upsert(newer.clone());
        assert_eq!(store.find("2024-03"), Some(&newer));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_is_sorted_by_month_key() {
        let mut store = InvoiceStore::default();
        store.upsert(invoice(2024, 4, ""));
        store.upsert(invoice(2023, 11, ""));
        store.upsert(invoice(2024, 0, ""));
        store.upsert(invoice(2024, 9, ""));
        let keys: Vec<_> = store.list().iter().map(|inv| inv.key.as_str()).collect();
        assert_eq!(keys, ["2023-12", "2024-01", "2024-05", "2024-10"]);
    }

    #[test]
    fn from_records_sorts_and_dedupes() {
        let store = InvoiceStore::from_records(vec![
            invoice(2024, 5, ""),
            invoice(2024, 1, "10"),
            invoice(2024, 1, "20"),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].key, "2024-02");
        assert_eq!(store.list()[0].invoiced_amount, dec!(20));
    }

    #[test]
    fn from_records_skips_inconsistent_months() {
        let mut out_of_range = invoice(2024, 11, "");
        out_of_range.month = 12;
        out_of_range.key = "2024-13".to_string();
        let mut mismatched = invoice(2024, 3, "");
        mismatched.key = "2024-07".to_string();

        let store = InvoiceStore::from_records(vec![out_of_range, mismatched, invoice(2024, 1, "")]);
        let keys: Vec<_> = store.list().iter().map(|inv| inv.key.as_str()).collect();
        assert_eq!(keys, ["2024-02"]);
    }

    #[test]
    fn find_missing_month() {
        assert!(InvoiceStore::default().find("2024-03").is_none());
    }

    #[test]
    fn preview_ignores_blank_and_invalid_text() {
        let s = summary(1, dec!(9), dec!(28.80));
        assert_eq!(preview_variance("", &s), None);
        assert_eq!(preview_variance("abc", &s), None);
        assert_eq!(preview_variance("30", &s), Some(Variance::OverInvoiced(dec!(1.20))));
    }
}
