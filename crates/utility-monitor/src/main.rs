mod bootstrap;
mod report;

use anyhow::{Context, Result};
use meter_core::settings::Settings;
use meter_data::export::ExportFormat;
use meter_runtime::entry::ManualEntry;
use meter_runtime::session::Session;

use crate::report::View;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Utility Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, export format: {}",
        settings.view,
        settings.export_format
    );

    let mut session = Session::new();

    if let Some(path) = &settings.input {
        session
            .import_file(path)
            .await
            .with_context(|| format!("could not import {}", path.display()))?;
    }

    for raw in &settings.entries {
        match session.add_manual_entry(&ManualEntry::from_cli(raw)) {
            Ok(record) => tracing::info!("Added {} reading for {}", record.source, record.date),
            Err(e) => eprintln!("Entry '{}' rejected: {}", raw, e),
        }
    }

    let view = View::parse(&settings.view).unwrap_or(View::All);
    print!("{}", report::render(session.state(), view));

    if let Some(dir) = &settings.export {
        let format = ExportFormat::from_setting(&settings.export_format)?;
        let today = chrono::Local::now().date_naive();
        let path = session
            .export_to(dir, format, today)
            .with_context(|| format!("could not export to {}", dir.display()))?;
        println!("\nRelatório salvo em {}", path.display());
    }

    Ok(())
}
