//! Offline-Cache-Verwaltung für knobel.
//!
//! Eine *Generation* ist ein unveränderlicher, versionierter Snapshot der
//! App-Assets. Pro Client ist genau eine Generation aktiv; höchstens eine
//! weitere wartet nach dem Download auf ihre Freigabe. Die Freigabe erfolgt
//! ausschließlich auf ausdrückliches Nutzersignal, nie automatisch - eine
//! laufende Sitzung wird dadurch nicht unterbrochen.

pub mod error;
pub mod policy;
pub mod store;
pub mod update;

pub use error::CacheError;
pub use policy::{classify, AssetRequest, FetchStrategy};
pub use store::{
    AssetFetcher, GenerationState, GenerationStore, Served, TabMessage, WorkerMessage,
};
pub use update::{check_for_updates, ProbeState, UpdateCheckConfig, UpdateOutcome, UpdateProbe};
