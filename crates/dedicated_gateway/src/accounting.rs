// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Request charge accounting.

use std::fmt;

use gateway_store::RequestCharge;
use parking_lot::Mutex;

use crate::OperationKind;

/// Where a dispatched operation was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServedFrom {
    /// The integrated cache answered.
    Cache,
    /// The backing store answered.
    Store,
}

impl ServedFrom {
    /// Returns a stable name for this source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The charge of one completed dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeRecord {
    kind: OperationKind,
    units: RequestCharge,
    served_from: ServedFrom,
}

impl ChargeRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(kind: OperationKind, units: RequestCharge, served_from: ServedFrom) -> Self {
        Self { kind, units, served_from }
    }

    /// Returns the kind of the dispatched operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the charged units.
    #[must_use]
    pub fn units(&self) -> RequestCharge {
        self.units
    }

    /// Returns where the operation was served from.
    #[must_use]
    pub fn served_from(&self) -> ServedFrom {
        self.served_from
    }
}

impl fmt::Display for ChargeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.units, self.served_from)
    }
}

/// A position in the accounting log, see [`CostAccounting::mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AccountingMark(usize);

/// Aggregated view over the accounting log.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccountingSummary {
    /// Number of recorded dispatches.
    pub operations: usize,
    /// Dispatches served from the cache.
    pub served_from_cache: usize,
    /// Dispatches served from the backing store.
    pub served_from_store: usize,
    /// Sum of all charges.
    pub total: RequestCharge,
}

/// An append-only log of [`ChargeRecord`]s.
///
/// # Examples
///
/// ```
/// use dedicated_gateway::{ChargeRecord, CostAccounting, OperationKind, ServedFrom};
/// use gateway_store::RequestCharge;
///
/// let accounting = CostAccounting::new();
/// accounting.record(ChargeRecord::new(OperationKind::Create, RequestCharge::new(6.0), ServedFrom::Store));
///
/// let mark = accounting.mark();
/// accounting.record(ChargeRecord::new(OperationKind::PointRead, RequestCharge::ZERO, ServedFrom::Cache));
///
/// assert_eq!(accounting.total(), RequestCharge::new(6.0));
/// assert_eq!(accounting.total_since(mark), RequestCharge::ZERO);
/// ```
#[derive(Debug, Default)]
pub struct CostAccounting {
    records: Mutex<Vec<ChargeRecord>>,
}

impl CostAccounting {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(&self, record: ChargeRecord) {
        self.records.lock().push(record);
    }

    /// Returns a copy of all records in dispatch order.
    #[must_use]
    pub fn records(&self) -> Vec<ChargeRecord> {
        self.records.lock().clone()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Returns the sum of all recorded charges.
    #[must_use]
    pub fn total(&self) -> RequestCharge {
        Self::total_for(&self.records.lock())
    }

    /// Returns the sum of the given records' charges.
    #[must_use]
    pub fn total_for(records: &[ChargeRecord]) -> RequestCharge {
        records.iter().map(ChargeRecord::units).sum()
    }

    /// Returns a mark at the current end of the log.
    #[must_use]
    pub fn mark(&self) -> AccountingMark {
        AccountingMark(self.len())
    }

    /// Returns the records appended after `mark`.
    #[must_use]
    pub fn records_since(&self, mark: AccountingMark) -> Vec<ChargeRecord> {
        self.records.lock().get(mark.0..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Returns the sum of the charges appended after `mark`.
    #[must_use]
    pub fn total_since(&self, mark: AccountingMark) -> RequestCharge {
        self.records
            .lock()
            .get(mark.0..)
            .map_or(RequestCharge::ZERO, Self::total_for)
    }

    /// Summarizes the whole log.
    #[must_use]
    pub fn summary(&self) -> AccountingSummary {
        self.records
            .lock()
            .iter()
            .fold(AccountingSummary::default(), |mut summary, record| {
                summary.operations += 1;
                summary.total += record.units();
                match record.served_from() {
                    ServedFrom::Cache => summary.served_from_cache += 1,
                    ServedFrom::Store => summary.served_from_store += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: OperationKind, units: f64, served_from: ServedFrom) -> ChargeRecord {
        ChargeRecord::new(kind, RequestCharge::new(units), served_from)
    }

    #[test]
    fn empty_log() {
        let accounting = CostAccounting::new();

        assert!(accounting.is_empty());
        assert_eq!(accounting.total(), RequestCharge::ZERO);
        assert_eq!(accounting.summary(), AccountingSummary::default());
    }

    #[test]
    fn records_keep_dispatch_order() {
        let accounting = CostAccounting::new();
        accounting.record(record(OperationKind::Create, 6.0, ServedFrom::Store));
        accounting.record(record(OperationKind::PointRead, 1.0, ServedFrom::Store));

        let kinds: Vec<_> = accounting.records().iter().map(ChargeRecord::kind).collect();
        assert_eq!(kinds, [OperationKind::Create, OperationKind::PointRead]);
        assert_eq!(accounting.total(), RequestCharge::new(7.0));
    }

    #[test]
    fn marks_delimit_batches() {
        let accounting = CostAccounting::new();
        accounting.record(record(OperationKind::Create, 6.0, ServedFrom::Store));
        let mark = accounting.mark();
        accounting.record(record(OperationKind::Query, 3.5, ServedFrom::Store));
        accounting.record(record(OperationKind::Query, 0.0, ServedFrom::Cache));

        assert_eq!(accounting.records_since(mark).len(), 2);
        assert_eq!(accounting.total_since(mark), RequestCharge::new(3.5));
        assert_eq!(accounting.total_since(accounting.mark()), RequestCharge::ZERO);
    }

    #[test]
    fn summary_counts_sources() {
        let accounting = CostAccounting::new();
        accounting.record(record(OperationKind::PointRead, 1.0, ServedFrom::Store));
        accounting.record(record(OperationKind::PointRead, 0.0, ServedFrom::Cache));
        accounting.record(record(OperationKind::PointRead, 0.0, ServedFrom::Cache));

        let summary = accounting.summary();
        assert_eq!(summary.operations, 3);
        assert_eq!(summary.served_from_cache, 2);
        assert_eq!(summary.served_from_store, 1);
        assert_eq!(summary.total, RequestCharge::new(1.0));
    }

    #[test]
    fn total_for_sums_a_slice() {
        let records = [
            record(OperationKind::ReadMany, 2.0, ServedFrom::Store),
            record(OperationKind::ReadMany, 0.5, ServedFrom::Cache),
        ];
        assert_eq!(CostAccounting::total_for(&records), RequestCharge::new(2.5));
    }

    #[test]
    fn record_display() {
        let record = record(OperationKind::PointRead, 1.0, ServedFrom::Store);
        assert_eq!(record.to_string(), "point_read 1.00 RU (store)");
    }
}
