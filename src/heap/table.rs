//! In-memory MVCC table storage.

use parking_lot::RwLock;

use super::error::HeapError;
use crate::catalog::TableDef;
use crate::datum::Value;
use crate::tx::{Snapshot, TransactionManager, TxId, TxState};

/// One version of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowVersion {
    /// Inserting transaction.
    pub xmin: TxId,
    /// Deleting transaction, INVALID while the row is live.
    pub xmax: TxId,
    /// Column values in table order.
    pub values: Vec<Value>,
}

/// A table: its definition and its row versions.
///
/// Rows are never removed physically. Aborted inserts and committed deletes
/// stay in the list and are filtered by visibility checks.
#[derive(Debug)]
pub struct Table {
    def: TableDef,
    rows: RwLock<Vec<RowVersion>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(def: TableDef) -> Self {
        Self {
            def,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Returns the table definition.
    pub fn def(&self) -> &TableDef {
        &self.def
    }

    /// Appends `rows` as new versions owned by `txid`.
    ///
    /// Values must already be coerced to the column types.
    pub fn insert(&self, txid: TxId, rows: Vec<Vec<Value>>) -> usize {
        let count = rows.len();
        let mut versions = self.rows.write();
        versions.extend(rows.into_iter().map(|values| RowVersion {
            xmin: txid,
            xmax: TxId::INVALID,
            values,
        }));
        count
    }

    /// Returns the values of every row visible to `snapshot`.
    pub fn scan(&self, snapshot: &Snapshot, tx_manager: &TransactionManager) -> Vec<Vec<Value>> {
        self.rows
            .read()
            .iter()
            .filter(|row| snapshot.is_visible(row.xmin, row.xmax, tx_manager))
            .map(|row| row.values.clone())
            .collect()
    }

    /// Marks every visible row matching `predicate` as deleted by `txid`.
    ///
    /// The predicate is evaluated for all visible rows before anything is
    /// marked, so a failing predicate leaves the table untouched. A matching
    /// row whose deletion by another transaction has not been aborted fails
    /// the whole statement with [`HeapError::SerializationFailure`].
    pub fn delete<F, E>(
        &self,
        txid: TxId,
        snapshot: &Snapshot,
        tx_manager: &TransactionManager,
        mut predicate: F,
    ) -> Result<usize, E>
    where
        F: FnMut(&[Value]) -> Result<bool, E>,
        E: From<HeapError>,
    {
        let mut versions = self.rows.write();

        let mut targets = Vec::new();
        for (i, row) in versions.iter().enumerate() {
            if !snapshot.is_visible(row.xmin, row.xmax, tx_manager) {
                continue;
            }
            if !predicate(&row.values)? {
                continue;
            }
            if !row.xmax.is_invalid()
                && row.xmax != txid
                && !matches!(tx_manager.state(row.xmax), Ok(TxState::Aborted))
            {
                return Err(HeapError::SerializationFailure {
                    table: self.def.qualified_name(),
                }
                .into());
            }
            targets.push(i);
        }

        for &i in &targets {
            versions[i].xmax = txid;
        }
        Ok(targets.len())
    }

    /// Counts rows whose insert committed and whose delete (if any) did not.
    ///
    /// This is what `system.tables.total_rows` reports: a reader-independent
    /// view of committed data.
    pub fn live_rows(&self, tx_manager: &TransactionManager) -> u64 {
        self.rows
            .read()
            .iter()
            .filter(|row| {
                tx_manager.is_committed(row.xmin)
                    && (row.xmax.is_invalid() || !tx_manager.is_committed(row.xmax))
            })
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, TableEngine};
    use crate::datum::Type;

    fn table() -> Table {
        Table::new(TableDef {
            database: "default".to_string(),
            name: "t".to_string(),
            columns: vec![ColumnDef::new("id", Type::UInt64)],
            engine: TableEngine::MergeTree,
            order_by: vec!["id".to_string()],
        })
    }

    fn ids(rows: Vec<Vec<Value>>) -> Vec<u64> {
        rows.into_iter()
            .map(|r| r[0].to_u64().unwrap())
            .collect()
    }

    fn delete_all(
        t: &Table,
        txid: TxId,
        manager: &TransactionManager,
    ) -> Result<usize, HeapError> {
        t.delete(txid, &manager.snapshot(txid), manager, |_| {
            Ok::<_, HeapError>(true)
        })
    }

    #[test]
    fn test_insert_visible_after_commit() {
        let manager = TransactionManager::new();
        let t = table();

        let tx = manager.begin();
        assert_eq!(t.insert(tx, vec![vec![Value::UInt64(1)], vec![Value::UInt64(2)]]), 2);

        assert_eq!(ids(t.scan(&manager.snapshot(tx), &manager)), vec![1, 2]);
        assert!(t.scan(&manager.snapshot(TxId::INVALID), &manager).is_empty());
        assert_eq!(t.live_rows(&manager), 0);

        manager.commit(tx).unwrap();
        assert_eq!(ids(t.scan(&manager.snapshot(TxId::INVALID), &manager)), vec![1, 2]);
        assert_eq!(t.live_rows(&manager), 2);
    }

    #[test]
    fn test_rolled_back_insert_never_visible() {
        let manager = TransactionManager::new();
        let t = table();

        let tx = manager.begin();
        t.insert(tx, vec![vec![Value::UInt64(1)]]);
        manager.abort(tx).unwrap();

        assert!(t.scan(&manager.snapshot(TxId::INVALID), &manager).is_empty());
        assert_eq!(t.live_rows(&manager), 0);
    }

    #[test]
    fn test_delete_with_predicate() {
        let manager = TransactionManager::new();
        let t = table();
        let tx = manager.begin();
        t.insert(tx, (1..=4).map(|i| vec![Value::UInt64(i)]).collect());
        manager.commit(tx).unwrap();

        let tx = manager.begin();
        let deleted = t
            .delete(tx, &manager.snapshot(tx), &manager, |row| {
                Ok::<_, HeapError>(row[0].to_u64().unwrap() % 2 == 0)
            })
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(ids(t.scan(&manager.snapshot(tx), &manager)), vec![1, 3]);
        // Others still see all rows until commit.
        assert_eq!(t.scan(&manager.snapshot(TxId::INVALID), &manager).len(), 4);

        manager.commit(tx).unwrap();
        assert_eq!(t.live_rows(&manager), 2);
    }

    #[test]
    fn test_concurrent_delete_conflicts() {
        let manager = TransactionManager::new();
        let t = table();
        let tx = manager.begin();
        t.insert(tx, vec![vec![Value::UInt64(1)]]);
        manager.commit(tx).unwrap();

        let tx1 = manager.begin();
        let tx2 = manager.begin();
        assert_eq!(delete_all(&t, tx1, &manager), Ok(1));
        assert!(matches!(
            delete_all(&t, tx2, &manager),
            Err(HeapError::SerializationFailure { .. })
        ));

        // Once tx1 aborts, tx2 may delete.
        manager.abort(tx1).unwrap();
        assert_eq!(delete_all(&t, tx2, &manager), Ok(1));
    }

    #[test]
    fn test_failing_predicate_marks_nothing() {
        let manager = TransactionManager::new();
        let t = table();
        let tx = manager.begin();
        t.insert(tx, vec![vec![Value::UInt64(1)], vec![Value::UInt64(2)]]);
        manager.commit(tx).unwrap();

        #[derive(Debug)]
        struct Boom;
        impl From<HeapError> for Boom {
            fn from(_: HeapError) -> Self {
                Boom
            }
        }

        let tx = manager.begin();
        let mut seen = 0;
        let result = t.delete(tx, &manager.snapshot(tx), &manager, |_| {
            seen += 1;
            if seen == 2 { Err(Boom) } else { Ok(true) }
        });
        assert!(result.is_err());
        assert_eq!(t.scan(&manager.snapshot(tx), &manager).len(), 2);
    }
}
