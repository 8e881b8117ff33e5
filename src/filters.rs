use std::fmt::Display;

/// Whole-dollar price, e.g. `35` renders as `$35`.
pub fn dollars<T: Display>(amount: T) -> ::askama::Result<String> {
    Ok(format!("${amount}"))
}
