/// Turn a backend field name such as `loyalty_member::tier_name` into `Loyalty Member Tier Name`.
pub fn format_field_name(field_name: &str) -> String {
    let spaced = field_name.replace("::", " ").replace('_', " ");
    let mut formatted = String::with_capacity(spaced.len());
    let mut previous_is_word = false;
    for ch in spaced.chars() {
        let is_word = ch.is_alphanumeric();
        if is_word && !previous_is_word {
            formatted.extend(ch.to_uppercase());
        } else {
            formatted.push(ch);
        }
        previous_is_word = is_word;
    }
    formatted
}

/// Display text for an option, falling back to the formatted field name.
pub fn display_or_formatted(display_name: &str, field_name: &str) -> String {
    if display_name.trim().is_empty() {
        format_field_name(field_name)
    } else {
        display_name.to_string()
    }
}
