//! Harvester engine: capabilities, the reclamation pipeline and the idle-driven agent loop.
mod capability;
mod engine;
mod extract;
mod idle;
mod inventory;
mod persist;
mod reclaim;
mod settings;
mod snapshot;
mod submit;
mod types;

pub use capability::{ContentExtractor, ResourceEnumerator, Submitter};
pub use engine::{Agent, AgentHandle};
pub use extract::{
    readable_text, FallbackExtractor, MetadataExtractor, PageText, SnapshotExtractor,
    DEFAULT_MAX_BODY_CHARS,
};
pub use idle::{
    classify, ActivityProbe, ActivitySample, FileActivityProbe, IdleConfig, IdleDetector,
    IdleEventSource, ProbeError,
};
pub use inventory::{Container, Inventory, InventoryError, InventoryFile};
pub use persist::{ensure_dir, write_atomic, PersistError};
pub use reclaim::{CycleReport, ReclaimSettings, Reclaimer};
pub use settings::{RonSettingsStore, SettingsError, SettingsStore, ThresholdWatcher};
pub use snapshot::{
    decode_snapshot, DecodeError, DecodedSnapshot, DirectorySnapshotSource, RawSnapshot,
    SnapshotSource,
};
pub use submit::{ReqwestSubmitter, SubmitSettings};
pub use types::{
    DestroyError, EnumerationError, ExtractionError, SubmitOutcome, TransportCause,
    TransportError,
};
pub use url::Url;
