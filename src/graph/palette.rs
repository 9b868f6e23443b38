pub const DEFAULT_COLOR: &str = "#94a3b8";

const PALETTE: [(&str, &str); 7] = [
    ("domain", "#3b82f6"),
    ("email", "#10b981"),
    ("ip", "#f59e0b"),
    ("username", "#8b5cf6"),
    ("repo", "#ef4444"),
    ("person", "#ec4899"),
    ("service", "#64748b"),
];

pub fn entity_color(kind: &str) -> &'static str {
    PALETTE
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}
