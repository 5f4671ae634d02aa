/// Prepends `https://` to a website that was given without a scheme.
///
/// Places results usually carry full URLs, but location exports and older
/// rows hold bare hosts like `bakery1.com`.
/// Example: `"bakery1.com/contact"` → `"https://bakery1.com/contact"`
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
