pub mod bundle;
pub mod cache;
pub mod collectors;
pub mod fingerprint;

pub use bundle::{
    CollectorFailure, DnsEvidence, DomEvidence, EvidenceBundle, EvidenceSource, HeaderEvidence,
    OsintEvidence, TlsEvidence,
};
pub use cache::TtlCache;
pub use collectors::{EvidenceCollectors, HttpCollectors};
pub use fingerprint::fingerprint_technologies;
