//! Apply command handler

use anyhow::{Context, Result};
use colored::*;

use super::{ApplyCommand, build_service};
use sheetmap::Config;
use sheetmap::import::MappingInstruction;
use sheetmap::import::report::write_result_excel;

/// Reconcile the staged spreadsheet of a session against the record files
pub async fn handle_apply_command(args: ApplyCommand, config: &Config) -> Result<()> {
    let service = build_service(config, &args.data_dir).await?;

    let instruction = MappingInstruction {
        session_id: args.session.clone(),
        upload_type: args.upload_type.clone(),
        mapping: args.mapping,
    };

    let result = service
        .write_mapping(&instruction)
        .await
        .with_context(|| format!("Failed to apply mapping for session {}", args.session))?;

    println!(
        "{} rows updated, {} rows failed",
        result.successful_rows.to_string().bright_green().bold(),
        if result.unsuccessful_rows > 0 {
            result.unsuccessful_rows.to_string().bright_red().bold()
        } else {
            result.unsuccessful_rows.to_string().normal()
        }
    );

    for failure in &result.failed_rows {
        println!("  {} {}", format!("{}:", failure.title).red(), failure.message);
    }

    if let Some(path) = &args.report {
        write_result_excel(&result, path)?;
        println!("Report written to {}", path.display().to_string().cyan());
    }

    if args.discard {
        service.discard(&args.session).await?;
    }
    Ok(())
}
