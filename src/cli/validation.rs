use crate::cli::args::{CliArgs, Command};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(url) = args.base_url.as_deref() {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| format!("invalid --base-url '{url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("invalid --base-url '{url}': expected http or https"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive number of seconds".to_string());
        }
    }
    if let Some(retries) = args.retries {
        if retries > 10 {
            return Err("invalid --retries, expected at most 10".to_string());
        }
    }

    match &args.command {
        Command::List(list) => {
            if list.page == Some(0) {
                return Err("invalid --page, pages start at 1".to_string());
            }
            if list.page_size == Some(0) {
                return Err("invalid --page-size, expected positive integer".to_string());
            }
            if let Some(raw) = list.filters.neutered.as_deref() {
                if !matches!(raw.trim().to_lowercase().as_str(), "yes" | "no") {
                    return Err(format!("invalid --neutered '{raw}', expected yes or no"));
                }
            }
            validate_format(list.output.format.as_deref())?;
        }
        Command::Search { term, page, output } => {
            if term.trim().is_empty() {
                return Err("search term is empty".to_string());
            }
            if *page == Some(0) {
                return Err("invalid --page, pages start at 1".to_string());
            }
            validate_format(output.format.as_deref())?;
        }
        Command::Show { id, output } => {
            if id.trim().is_empty() {
                return Err("animal id is empty".to_string());
            }
            validate_format(output.format.as_deref())?;
        }
        Command::Donations { limit, output } => {
            if *limit == 0 {
                return Err("invalid --limit, expected positive integer".to_string());
            }
            validate_format(output.format.as_deref())?;
        }
        Command::Login { email, .. } | Command::Register { email, .. } => {
            if !crate::utils::is_plausible_email(email) {
                return Err(format!("invalid --email '{email}'"));
            }
        }
        Command::Donate { amount, email, .. } => {
            if !(amount.is_finite() && *amount > 0.0) {
                return Err("invalid --amount, expected a positive number".to_string());
            }
            if let Some(email) = email.as_deref() {
                if !crate::utils::is_plausible_email(email) {
                    return Err(format!("invalid --email '{email}'"));
                }
            }
        }
        Command::Update { patch, .. } => {
            let patch = patch.to_patch()?;
            if patch.is_empty() {
                return Err("nothing to update, pass at least one field flag".to_string());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_format(format: Option<&str>) -> Result<(), String> {
    if let Some(raw) = format {
        if crate::render::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text, json or html"));
        }
    }
    Ok(())
}
