use crate::replay::ReplayData;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// Persisted replay encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    /// Gzip over the json encoding.
    Compressed,
}

/// Serializes a replay envelope for storage or download.
pub fn export(replay: &ReplayData, format: ExportFormat) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_vec(replay)?;
    match format {
        ExportFormat::Json => Ok(json),
        ExportFormat::Compressed => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json)?;
            Ok(encoder.finish()?)
        }
    }
}
