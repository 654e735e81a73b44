use std::collections::HashSet;

use crate::models::AnimalStatus;

pub fn parse_u16_set_csv(value: &str) -> Result<HashSet<u16>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("list is empty".to_string());
    }
    let mut out = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let code: u16 = item
            .parse()
            .map_err(|_| format!("invalid status code '{item}'"))?;
        out.insert(code);
    }
    if out.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(out)
}

/// Splits a comma-separated list, dropping blanks and duplicates but keeping
/// first-seen order.
pub fn parse_csv_list(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in value.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_lowercase()) {
            out.push(item.to_string());
        }
    }
    out
}

/// Strict parse for user input; unlike the wire decoding, unknown values are
/// rejected rather than treated as available.
pub fn parse_status(value: &str) -> Option<AnimalStatus> {
    match value.trim().to_lowercase().as_str() {
        "available" => Some(AnimalStatus::Available),
        "reserved" => Some(AnimalStatus::Reserved),
        "adopted" => Some(AnimalStatus::Adopted),
        "pending" => Some(AnimalStatus::Pending),
        _ => None,
    }
}

pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !value.contains(' ')
        }
        None => false,
    }
}
