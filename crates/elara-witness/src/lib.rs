pub mod attestation;
pub mod store;

pub use attestation::WitnessAttestation;
pub use store::{WitnessStats, WitnessStore};
