//! Phone number normalization to the gateway's MSISDN format.

/// Kenyan country code, as the gateway expects it (no `+`).
pub const COUNTRY_CODE: &str = "254";

/// Normalize a subscriber number to international format.
///
/// A leading `0` is replaced with the country code; a number already
/// carrying the country code is left unchanged; anything else gets the
/// country code prepended.
pub fn normalize(phone: &str) -> String {
    if let Some(rest) = phone.strip_prefix('0') {
        format!("{COUNTRY_CODE}{rest}")
    } else if phone.starts_with(COUNTRY_CODE) {
        phone.to_owned()
    } else {
        format!("{COUNTRY_CODE}{phone}")
    }
}
