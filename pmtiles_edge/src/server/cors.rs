//! Origin allow-listing.
//!
//! Each configured entry is either `*` or an exact origin. An entry selects the
//! request if it is `*` or equals the `Origin` header; when several entries
//! select it, the last one wins. The selected entry itself becomes the value of
//! `Access-Control-Allow-Origin`, so a `*` entry answers with `*`.

/// Returns the `Access-Control-Allow-Origin` value for a request, if any.
pub fn allowed_origin<'a>(allowed_origins: &'a [String], origin: Option<&str>) -> Option<&'a str> {
	allowed_origins
		.iter()
		.rev()
		.map(String::as_str)
		.find(|entry| !entry.is_empty() && (*entry == "*" || Some(*entry) == origin))
}
