use serde_json::Value;

pub(crate) const RESPONSE_PANEL_TITLE: &str = "AI decision engine response";
const RAW_RESPONSE_PANEL_TITLE: &str = "AI response (raw)";

/// Renders a JSON value pretty-printed with line numbers inside a titled frame.
pub(crate) fn render_json_panel(title: &str, value: &Value) -> String {
    let (title, body) = match serde_json::to_string_pretty(value) {
        Ok(pretty) => (title, pretty),
        Err(_) => (RAW_RESPONSE_PANEL_TITLE, value.to_string()),
    };
    let lines = body.lines().collect::<Vec<_>>();
    let number_width = lines.len().max(1).to_string().len();
    let content_width = lines
        .iter()
        .map(|line| line.chars().count() + number_width + 3)
        .max()
        .unwrap_or(0)
        .max(title.chars().count() + 4);

    let mut output = Vec::with_capacity(lines.len() + 2);
    let header_fill = content_width.saturating_sub(title.chars().count() + 3);
    output.push(format!("+- {title} {}", "-".repeat(header_fill)));
    for (index, line) in lines.iter().enumerate() {
        output.push(format!("| {:>number_width$} {line}", index + 1));
    }
    output.push(format!("+{}", "-".repeat(content_width)));
    output.join("\n")
}

/// Renders a titled bullet list.
pub(crate) fn render_list<S: AsRef<str>>(title: &str, items: &[S]) -> String {
    let mut lines = vec![format!("{title}:")];
    lines.extend(items.iter().map(|item| format!("  - {}", item.as_ref())));
    lines.join("\n")
}
