//! Offline payload validation against the message and event pipelines.

use {anyhow::Context, serde_json::Value, std::path::Path};

use upwire_messages::report::validation_report;

pub fn handle_validate(file: &Path, event: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    if event {
        validate_event(file, &payload)
    } else {
        validate_message(file, &payload)
    }
}

fn validate_event(file: &Path, payload: &Value) -> anyhow::Result<()> {
    let validation = upwire_events::validate(payload);
    if validation.is_valid {
        println!("{}: valid GSMA UP event", file.display());
        return Ok(());
    }

    println!("{}: invalid GSMA UP event", file.display());
    for error in &validation.errors {
        println!("  - {error}");
    }
    anyhow::bail!("event validation failed")
}

fn validate_message(file: &Path, payload: &Value) -> anyhow::Result<()> {
    let validation = upwire_messages::validate::validate(payload);
    if validation.valid {
        match validation.format {
            Some(format) => println!("{}: valid ({format})", file.display()),
            None => println!("{}: valid", file.display()),
        }
        return Ok(());
    }

    println!("{}: invalid message payload", file.display());
    for entry in validation_report(&validation) {
        println!("  [{}] {}", entry.category, entry.message);
        if entry.technical != entry.message {
            println!("      technical: {}", entry.technical);
        }
    }
    anyhow::bail!("message validation failed")
}
