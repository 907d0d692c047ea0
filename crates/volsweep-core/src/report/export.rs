/// Export of the merged match list.
use crate::error::Result;
use crate::model::MatchRecord;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One absolute path per line.
    #[default]
    Plain,
    /// `volume,path` with a header row.
    Csv,
    /// A JSON array of `{ "volume": ..., "path": ... }` objects.
    Json,
}

/// Write `matches` to `out` in merge order.
pub fn write_matches<W: Write>(
    mut out: W,
    matches: &[MatchRecord],
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Plain => {
            for record in matches {
                writeln!(out, "{}", record.path.display())?;
            }
            out.flush()?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for record in matches {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, matches)?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(())
}
