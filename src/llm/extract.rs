use serde_json::{Map, Value};

use crate::error::AttemptError;
use crate::synthesis::SynthesisReport;

/// Parses the leftmost `{` through the rightmost `}` of `raw_text` as a JSON object.
///
/// The match is greedy: prose containing stray braces, or several independent
/// objects, makes the candidate unparseable and the attempt fails.
pub fn extract_report(raw_text: &str) -> Result<SynthesisReport, AttemptError> {
    let candidate = json_candidate(raw_text).ok_or_else(|| {
        AttemptError::Extraction(format!("no JSON object in {:?}", truncate(raw_text, 200)))
    })?;

    let map: Map<String, Value> = serde_json::from_str(candidate).map_err(|e| {
        AttemptError::Extraction(format!("{e} in {:?}", truncate(candidate, 200)))
    })?;

    if map.is_empty() {
        return Err(AttemptError::Extraction("empty JSON object".to_string()));
    }

    Ok(SynthesisReport::from(map))
}

pub(crate) fn json_candidate(content: &str) -> Option<&str> {
    if let Some(start) = content.find('{')
        && let Some(end) = content.rfind('}')
        && start < end
    {
        return Some(&content[start..=end]);
    }
    None
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.char_indices()
            .take_while(|&(i, _)| i < max)
            .map(|(_, c)| c)
            .collect()
    }
}
