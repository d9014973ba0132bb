/// Pulls the suggested file name out of a `content-disposition` header value.
///
/// Everything after `filename=` is taken, trimmed and stripped of one pair of
/// surrounding double quotes. Names that would escape the session folder are
/// rejected.
pub fn filename(header: &str) -> Option<String> {
    let (_, name) = header.split_once("filename=")?;
    let name = name.trim();
    let name = name
        .strip_prefix('"')
        .and_then(|name| name.strip_suffix('"'))
        .unwrap_or(name)
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }

    Some(name.to_string())
}
