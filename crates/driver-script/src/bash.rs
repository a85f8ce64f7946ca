//! Bash control-flow snippets.

/// Indentation used inside generated blocks.
pub const INDENT: &str = "    ";

fn indented<'a>(lines: &'a [String]) -> impl Iterator<Item = String> + 'a {
    lines.iter().map(|line| {
        if line.is_empty() {
            String::new()
        } else {
            format!("{INDENT}{line}")
        }
    })
}

/// `for` loop over `iteration` (e.g. `for dir in ./*`) running `body` each time.
pub fn bash_for_loop(iteration: &str, body: &[String]) -> Vec<String> {
    let mut lines = vec![format!("{}; do", iteration.trim().trim_end_matches(';'))];
    lines.extend(indented(body));
    lines.push("done".to_string());
    lines
}

/// `if` statement running `then` when `condition` holds and `otherwise`, if any, when it does not.
pub fn bash_if_statement(condition: &str, then: &[String], otherwise: Option<&[String]>) -> Vec<String> {
    let condition = condition.trim();
    let condition = condition.strip_prefix("if ").unwrap_or(condition);
    let condition = condition.strip_suffix("; then").unwrap_or(condition);
    let mut lines = vec![format!("if {condition}; then")];
    lines.extend(indented(then));
    if let Some(otherwise) = otherwise {
        lines.push("else".to_string());
        lines.extend(indented(otherwise));
    }
    lines.push("fi".to_string());
    lines
}
