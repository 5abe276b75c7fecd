pub mod db;
pub mod record;

pub use db::{DagStats, LocalDAG};
pub use record::{RecordId, ValidationRecord};
