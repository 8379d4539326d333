use crate::error::AppError;
use crate::models::RawInvoiceRow;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write raw rows as semicolon-separated CSV, header row taken from the field names.
pub fn write_raw_csv<W: Write>(rows: &[RawInvoiceRow], out: W) -> Result<(), AppError> {
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Dump the scraped rows before normalization, for inspecting a run.
pub fn export_raw_csv(rows: &[RawInvoiceRow], output_path: &Path) -> Result<(), AppError> {
    let file = File::create(output_path)?;
    write_raw_csv(rows, file)?;
    tracing::info!("Wrote {} raw rows to {}", rows.len(), output_path.display());
    Ok(())
}
