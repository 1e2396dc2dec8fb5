use deskline_domain::FileDescriptor;
use serde_json::Value;

/// Keys the backend has been observed using for the download url, in
/// the order they win when more than one is present.
const URI_KEYS: [&str; 4] = ["fileUrl", "FileURL", "url", "uri"];
const NAME_KEYS: [&str; 2] = ["Filename", "name"];
const FALLBACK_NAME: &str = "Unnamed";

const LOCALHOST_PREFIXES: [&str; 2] = ["http://localhost:8080", "https://localhost:8080"];

/// Turns one raw file record into a [`FileDescriptor`]. The backend is
/// inconsistent about field names and sometimes hands out localhost urls
/// from its own dev setup, so all of that is smoothed over here.
pub(crate) fn normalize_file_record(record: &Value, api_base: &str) -> FileDescriptor {
    let raw_uri = first_string(record, &URI_KEYS).unwrap_or_default();
    let uri = encode_uri(&rewrite_localhost(&raw_uri, api_base));
    let name = first_string(record, &NAME_KEYS)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_owned());
    FileDescriptor::new(name, uri)
}

fn first_string(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    })
}

fn rewrite_localhost(uri: &str, api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    for prefix in LOCALHOST_PREFIXES {
        if let Some(rest) = uri.strip_prefix(prefix) {
            return format!("{base}{rest}");
        }
    }
    uri.to_owned()
}

/// Percent-encodes a url the way browsers do for whole-url encoding:
/// reserved characters and unreserved marks pass through untouched,
/// everything else (spaces included) is encoded byte by byte.
fn encode_uri(uri: &str) -> String {
    let mut encoded = String::with_capacity(uri.len());
    for byte in uri.bytes() {
        if is_uri_safe(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn is_uri_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b';' | b',' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b'-' | b'_'
                | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' | b'#'
        )
}
