pub const SYSTEM_PROMPT: &str = "You are SPECTRE, an expert intelligence analyst. \
Analyze the provided case data and generate a structured report. \
Your output MUST be strict JSON.\n\
Format:\n\
{\n  \"findings\": [\"string\"],\n  \"risks\": [\"string\"],\n  \"connections\": [\"string\"],\n  \"next_steps\": [\"string\"],\n  \"confidence\": 0.85\n}";

pub const CASE_DATA_HEADER: &str = "CASE DATA:";

/// Plain concatenation; the context is not escaped.
pub fn build_prompt(system_prompt: &str, context: &str) -> String {
    format!("{system_prompt}\n\n{CASE_DATA_HEADER}\n{context}")
}
