//! Patient records: the scan history model and the stores that hold it.

pub mod locks;
pub mod model;
pub mod orphans;
pub mod sqlite;
pub mod store;

pub use locks::{PatientGuard, PatientLocks};
pub use model::{Patient, ScanRecord};
pub use orphans::{LogOrphanLedger, OrphanLedger, OrphanedObject, SqliteOrphanLedger};
pub use sqlite::SqliteRecordStore;
pub use store::RecordStore;
