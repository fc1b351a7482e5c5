use crate::feed::Article;

/// Render an article as a Telegram HTML message
pub fn format_message(article: &Article, summary: &str) -> String {
    format!(
        "<b>{}</b>\n\n{}\n\n{}",
        escape_html(article.title.trim()),
        escape_html(summary.trim()),
        escape_html(&article.link),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
