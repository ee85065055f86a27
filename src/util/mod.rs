pub(crate) mod alphabet;
pub(crate) mod captures;
pub(crate) mod iter;
pub(crate) mod look;
pub(crate) mod primitives;
pub(crate) mod search;

/// Renders bytes for debug output: printable ASCII as-is, everything else
/// as a hex escape.
pub(crate) fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if 0x20 <= b && b <= 0x7E && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{:02X}", b));
        }
    }
    out
}
