//! Preview command handler

use anyhow::{Context, Result};
use colored::*;

use super::{PreviewCommand, preview_service};
use sheetmap::Config;
use sheetmap::import::UploadData;

/// Stage the file and print what the operator needs to build a mapping
pub async fn handle_preview_command(args: PreviewCommand, config: &Config) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Spreadsheet does not exist: {}", args.file.display());
    }

    let service = preview_service(config).await?;

    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("Failed to open spreadsheet: {}", args.file.display()))?;

    let options = service
        .read_file(UploadData {
            uploaded_file: file,
            upload_type: args.upload_type.clone(),
            session_id: args.session.clone(),
        })
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    println!("Session: {}", options.session_id.bright_green().bold());
    println!();

    println!("{}", "Columns".bold());
    for (idx, header) in options.header_row.iter().enumerate() {
        let samples: Vec<&str> = options
            .sample_rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect();
        println!(
            "  {:>3}  {:<30} {}",
            idx.to_string().cyan(),
            header,
            samples.join(" | ").dimmed()
        );
    }
    println!();

    println!("{} ({})", "Fields".bold(), args.upload_type);
    let dictionary = service.dictionaries().dictionary_for(&args.upload_type)?;
    for (key, label) in dictionary.iter() {
        println!("  {:<22} {}", key.yellow(), label);
    }
    println!();

    println!(
        "Apply with: sheetmap apply --session {} --type {} --map <column>=<field> ...",
        options.session_id, args.upload_type
    );
    Ok(())
}
