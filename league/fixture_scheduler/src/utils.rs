use chrono::NaiveTime;

use crate::config::ScanOrder;
use crate::error::ConfigError;

pub fn parse_slot(slot: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(slot.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidSlot(slot.trim().to_string()))
}

/// Parses a comma separated list such as `16:00,18:30,21:00`.
///
/// Slots are sorted and de-duplicated so the earliest slot of a day is always first.
pub fn parse_slot_list(slots: &str) -> Result<Vec<NaiveTime>, ConfigError> {
    let mut parsed = slots
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_slot)
        .collect::<Result<Vec<_>, _>>()?;
    if parsed.is_empty() {
        return Err(ConfigError::EmptySlotList);
    }
    parsed.sort();
    parsed.dedup();
    Ok(parsed)
}

pub fn parse_scan_order(value: &str) -> Result<ScanOrder, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "tail" | "tail_first" => Ok(ScanOrder::TailFirst),
        "head" | "head_first" => Ok(ScanOrder::HeadFirst),
        other => Err(ConfigError::InvalidScanOrder(other.to_string())),
    }
}
