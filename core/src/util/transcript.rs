/// Append `line` to `buf`, dropping the oldest text so that `buf` stays
/// within `max_bytes`. Cuts only on char boundaries.
pub fn append_bounded(buf: &mut String, line: &str, max_bytes: usize) {
    buf.push_str(line);
    if !line.ends_with('\n') {
        buf.push('\n');
    }
    if max_bytes == 0 || buf.len() <= max_bytes {
        return;
    }
    let mut cut = buf.len() - max_bytes;
    while !buf.is_char_boundary(cut) {
        cut += 1;
    }
    buf.drain(..cut);
}
