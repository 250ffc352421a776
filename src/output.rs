use anyhow::{Context, Result};
use log::{error, info};
use sandwich_common::{Lattice, OutputConfig, SimulationRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialization format of the saved run record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Bincode,
    MessagePack,
}

impl RecordFormat {
    /// Parses the `output.format` setting; unknown names fall back to JSON.
    pub fn from_setting(format: Option<&str>) -> Self {
        match format.unwrap_or("json") {
            "json" => RecordFormat::Json,
            "bincode" => RecordFormat::Bincode,
            "messagepack" => RecordFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                RecordFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RecordFormat::Json => "json",
            RecordFormat::Bincode => "bin",
            RecordFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes the run record as `<base>_record.<ext>` and returns the path.
pub fn save_record(record: &SimulationRecord, output: &OutputConfig) -> Result<PathBuf> {
    let format = RecordFormat::from_setting(output.format.as_deref());
    let path = PathBuf::from(format!("{}_record.{}", output.base_filename, format.extension()));
    write_record(record, format, &path)?;
    Ok(path)
}

pub fn write_record(record: &SimulationRecord, format: RecordFormat, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating record file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        RecordFormat::Json => serde_json::to_writer(&mut writer, record)
            .context("Error serializing record to JSON")?,
        RecordFormat::Bincode => bincode::serialize_into(&mut writer, record)
            .context("Error serializing record to bincode")?,
        RecordFormat::MessagePack => rmp_serde::encode::write(&mut writer, record)
            .context("Error serializing record to MessagePack")?,
    }
    writer.flush()?;
    info!("Run record saved to {} ({} snapshots)", path.display(), record.snapshots.len());
    Ok(())
}

/// Writes the interior of a lattice as `x,y,cell_density,ecm_density` rows.
pub fn write_lattice_csv(lattice: &Lattice, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["x", "y", "cell_density", "ecm_density"])?;
    for (x, y, cell) in lattice.interior() {
        writer.write_record(&[
            x.to_string(),
            y.to_string(),
            format!("{:.8e}", cell.cell_density),
            format!("{:.8e}", cell.ecm_density),
        ])?;
    }
    writer.flush()?;
    info!("Final lattice saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_common::CellState;

    #[test]
    fn format_setting_falls_back_to_json() {
        assert_eq!(RecordFormat::from_setting(None), RecordFormat::Json);
        assert_eq!(RecordFormat::from_setting(Some("bincode")), RecordFormat::Bincode);
        assert_eq!(RecordFormat::from_setting(Some("messagepack")).extension(), "msgpack");
        assert_eq!(RecordFormat::from_setting(Some("yaml")), RecordFormat::Json);
    }

    #[test]
    fn csv_lists_every_interior_site() {
        let mut lattice = Lattice::new(2);
        lattice.set(2, 1, CellState::new(0.5, 0.25));
        let path = std::env::temp_dir().join(format!("sandwich_csv_test_{}.csv", std::process::id()));
        write_lattice_csv(&lattice, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "x,y,cell_density,ecm_density");
        assert!(lines[3].starts_with("2,1,5.00000000e-1"));
    }
}
