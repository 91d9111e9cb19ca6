//! Voice Catalog
//!
//! The set of synthesis voices a session may switch between. A catalog is
//! loaded once per worker process and shared read-only by every session the
//! process runs, so it exposes no mutating methods after construction.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Attribute key under which the voice listing is published to the room.
pub const VOICES_ATTRIBUTE: &str = "voices";

/// A single voice record as returned by the voice provider.
///
/// Only `id` and `name` are required. Providers return many more fields
/// (descriptions, timestamps, visibility flags); those are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Opaque speaker embedding handed to the synthesis engine as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<serde_json::Value>,
}

/// The `{id, name}` pair exposed to remote participants.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoiceListing {
    pub id: String,
    pub name: String,
}

/// Ordered, immutable collection of voices with unique ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    /// Builds a catalog, keeping provider order.
    ///
    /// Ids must be unique. When the provider repeats an id, the first record
    /// wins and the rest are dropped with a warning.
    pub fn new(voices: Vec<Voice>) -> Self {
        let mut seen = HashSet::new();
        let voices = voices
            .into_iter()
            .filter(|voice| {
                let fresh = seen.insert(voice.id.clone());
                if !fresh {
                    warn!(voice_id = %voice.id, "Dropping duplicate voice id from catalog");
                }
                fresh
            })
            .collect();
        Self { voices }
    }

    /// A catalog with no voices. Sessions treat this as "switching unavailable".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Finds a voice by exact id match.
    pub fn find(&self, voice_id: &str) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.id == voice_id)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Projects the catalog into the metadata published for a session.
    pub fn session_metadata(&self) -> SessionMetadata {
        let mut voices: Vec<VoiceListing> = self
            .voices
            .iter()
            .map(|voice| VoiceListing {
                id: voice.id.clone(),
                name: voice.name.clone(),
            })
            .collect();
        // Stable sort: equal names keep provider order.
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        SessionMetadata { voices }
    }
}

/// Remote-visible session information, published once during startup.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    /// Voices sorted by name, ascending and case-sensitive.
    pub voices: Vec<VoiceListing>,
}

impl SessionMetadata {
    /// Encodes the metadata as participant attributes.
    ///
    /// Attribute values are strings, so the listing is JSON-encoded under
    /// the `voices` key.
    pub fn to_attributes(&self) -> Result<HashMap<String, String>, serde_json::Error> {
        let encoded = serde_json::to_string(&self.voices)?;
        Ok(HashMap::from([(VOICES_ATTRIBUTE.to_string(), encoded)]))
    }
}
