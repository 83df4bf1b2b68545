/// REPL history aliases injected into every frame by the hosting notebook
/// kernel. Never user state, so never reported.
const REPL_HISTORY_ALIASES: [&str; 10] = [
    "_ih", "_dh", "_oh", "_", "_i", "_ii", "_iii", "_i1", "_i2", "_i3",
];

/// Interpreter-internal names are excluded from every locals summary:
/// dunder-prefixed names and the reserved REPL history aliases.
pub fn is_internal_name(name: &str) -> bool {
    name.starts_with("__") || REPL_HISTORY_ALIASES.contains(&name)
}
