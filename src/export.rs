use crate::api::ManagementClient;
use crate::auth::AccessToken;
use crate::error::AppError;
use crate::models::AliasRow;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const CSV_COLUMNS: [&str; 2] = ["name", "defaultPath"];

/// Query a resource provider and write its aliases to `output_path`.
///
/// Nothing is written unless the query succeeds. Returns the number of rows.
pub async fn export_resource_provider_aliases(
    client: &ManagementClient,
    token: &AccessToken,
    subscription_id: &str,
    namespace: &str,
    output_path: &Path,
) -> Result<usize, AppError> {
    tracing::info!("Querying for resource provider information...");
    let provider = client
        .get_resource_provider(token, subscription_id, namespace)
        .await?;

    let rows = provider.alias_rows();
    export_to_csv(&rows, output_path)?;

    tracing::info!("Exported {} aliases to {}", rows.len(), output_path.display());
    Ok(rows.len())
}

/// Write alias rows to a CSV file, replacing any existing file
pub fn export_to_csv(rows: &[AliasRow], path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Could not create export file {}", path.display()))?;
    write_csv(rows, file).with_context(|| format!("Could not write export file {}", path.display()))
}

/// Header plus one record per row, quoting only where needed
pub fn write_csv<W: Write>(rows: &[AliasRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        csv_writer.write_record([row.name.as_str(), row.default_path.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}
