use std::collections::HashMap;

use serde::Serialize;

use crate::error::PipelineError;
use crate::sheet::RawPlayer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub player_id: u32,
    pub height: f64,
    pub weight: f64,
    pub shoots: String,
}

/// `6'1` or `6'1"` -> 73.
pub fn height_to_inches(raw: &str) -> Option<u32> {
    let (feet, inches) = raw.trim().split_once('\'')?;
    let feet: u32 = feet.trim().parse().ok()?;
    let inches: u32 = inches.trim().trim_end_matches('"').trim().parse().ok()?;
    Some(feet * 12 + inches)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties go to the smallest.
fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_n), (b_val, b_n)| a_n.cmp(b_n).then(b_val.cmp(a_val)))
        .map(|(v, _)| v.to_string())
}

/// Converts heights and fills every gap with the column median (mode for handedness).
pub fn clean_players(raw: &[RawPlayer]) -> Result<Vec<PlayerRecord>, PipelineError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let heights: Vec<Option<f64>> = raw
        .iter()
        .map(|p| {
            p.height
                .as_deref()
                .and_then(height_to_inches)
                .map(f64::from)
        })
        .collect();
    let observed_heights: Vec<f64> = heights.iter().flatten().copied().collect();
    let observed_weights: Vec<f64> = raw.iter().filter_map(|p| p.weight).collect();

    let height_fill =
        median(&observed_heights).ok_or(PipelineError::NoObservedValues { field: "height" })?;
    let weight_fill =
        median(&observed_weights).ok_or(PipelineError::NoObservedValues { field: "weight" })?;
    let shoots_fill = mode(
        raw.iter()
            .filter_map(|p| p.shoots.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    )
    .ok_or(PipelineError::NoObservedValues { field: "shoots" })?;

    let imputed = heights.iter().filter(|h| h.is_none()).count();
    if imputed > 0 {
        tracing::debug!(imputed, fill = height_fill, "imputed missing heights");
    }

    Ok(raw
        .iter()
        .zip(heights)
        .map(|(p, height)| PlayerRecord {
            player_id: p.player_id,
            height: height.unwrap_or(height_fill),
            weight: p.weight.unwrap_or(weight_fill),
            shoots: p
                .shoots
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| shoots_fill.clone()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_parse() {
        assert_eq!(height_to_inches("6'1"), Some(73));
        assert_eq!(height_to_inches("5' 11\""), Some(71));
        assert_eq!(height_to_inches("73"), None);
        assert_eq!(height_to_inches("six'one"), None);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mode_tie_prefers_smallest() {
        assert_eq!(mode(["R", "L", "R", "L"]), Some("L".to_string()));
        assert_eq!(mode(["R", "L", "R"]), Some("R".to_string()));
    }
}
