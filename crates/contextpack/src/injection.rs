use dg_domain::turn::{DirectiveKind, Turn};

/// Format a preserved directive as the content of a system message.
pub fn format_directive(turn: &Turn) -> String {
    let tag = match turn.directive.map(|d| d.kind) {
        Some(DirectiveKind::Episode) => "EVENTO",
        _ => "NOTA DEL SISTEMA",
    };
    format!("[{tag}] {}", turn.text.trim())
}

/// Format the forced-attention suffix carried by the final user message.
pub fn format_episode_suffix(content: &str) -> String {
    format!(
        "\n\n[IMPORTANTE: tenelo en cuenta en esta respuesta] {}",
        content.trim()
    )
}
