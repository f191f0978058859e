use serde::Serialize;

/// Running counters for one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointDiagnostics {
    pub chunks_absorbed: u64,
    /// Per-channel samples absorbed.
    pub samples_absorbed: u64,
    pub frames_completed: u64,
    /// Staging reallocations after the initial configuration.
    pub reconfigurations: u64,
    /// Per-channel residue samples dropped by reconfigurations.
    pub discarded_residue_samples: u64,
}

/// Snapshot of both endpoints of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    pub render: EndpointDiagnostics,
    pub capture: EndpointDiagnostics,
}
