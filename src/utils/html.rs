/// Sanitises admin-authored question text with ammonia.
///
/// Formatting tags such as <b>, <i> and <p> survive; scripts, iframes and
/// event-handler attributes are stripped, since the text is rendered as HTML
/// to every candidate.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
