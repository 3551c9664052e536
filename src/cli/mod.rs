//! Terminal commands that work directly against the database file.

pub mod export;
pub mod inspect;
pub mod search;
pub mod stats;

/// Shorten `text` to at most `max` characters, appending `...` when cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max {
        let cut: String = single_line.chars().take(max).collect();
        format!("{cut}...")
    } else {
        single_line
    }
}
