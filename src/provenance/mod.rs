// src/provenance/mod.rs

//! Hash-linked audit trail of solver runs.
//!
//! Each stage of a run (problem definition, solve) is recorded with a SHA-256
//! digest of its data and a link to the digest of the previous record, so a
//! stored chain can be checked for tampering or reordering with
//! [`ProvenanceChain::verify`].

use crate::kernel::Field2;
use crate::LaplaceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single record in the provenance chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub data_hash: String,
    pub software_version: String,
    pub previous_record_hash: Option<String>,
    pub metadata: serde_json::Value,
}

impl ProvenanceRecord {
    pub fn new(
        event_type: &str,
        data: &[u8],
        previous_record_hash: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        ProvenanceRecord {
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            data_hash: sha256_hex(data),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            previous_record_hash,
            metadata,
        }
    }

    /// Digest of the whole record, used as the link from its successor.
    pub fn calculate_record_hash(&self) -> Result<String, LaplaceError> {
        let serialized = serde_json::to_vec(self).map_err(|e| LaplaceError::Provenance(e.to_string()))?;
        Ok(sha256_hex(&serialized))
    }
}

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Digest of a field's shape and values (little-endian, logical row-major order).
pub fn hash_field(field: &Field2) -> String {
    let mut hasher = Sha256::new();
    let (nx, ny) = field.dim();
    hasher.update((nx as u64).to_le_bytes());
    hasher.update((ny as u64).to_le_bytes());
    for v in field.iter() {
        hasher.update(v.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Default)]
pub struct ProvenanceChain {
    records: Vec<ProvenanceRecord>,
}

impl ProvenanceChain {
    pub fn new() -> Self {
        ProvenanceChain { records: Vec::new() }
    }

    /// Appends a record linked to the current tail.
    pub fn add_record(
        &mut self,
        event_type: &str,
        data: &[u8],
        metadata: serde_json::Value,
    ) -> Result<(), LaplaceError> {
        let previous_record_hash = match self.records.last() {
            Some(r) => Some(r.calculate_record_hash()?),
            None => None,
        };
        self.records.push(ProvenanceRecord::new(event_type, data, previous_record_hash, metadata));
        Ok(())
    }

    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    /// Checks that every record links to the digest of its predecessor.
    pub fn verify(&self) -> Result<(), LaplaceError> {
        let mut expected: Option<String> = None;
        for (idx, record) in self.records.iter().enumerate() {
            if record.previous_record_hash != expected {
                return Err(LaplaceError::Provenance(format!(
                    "record {} ('{}') does not link to its predecessor",
                    idx, record.event_type
                )));
            }
            expected = Some(record.calculate_record_hash()?);
        }
        Ok(())
    }

    /// Takes all records, leaving the chain empty for the next run.
    pub fn drain_records(&mut self) -> Vec<ProvenanceRecord> {
        std::mem::take(&mut self.records)
    }
}
