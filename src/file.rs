use std::path::Path;

use crate::error::{Error, Result};

/// Reads the raw `Cookie` header value saved from a logged in browser session.
pub fn read_cookie(path: &Path) -> Result<String> {
    let cookie = std::fs::read_to_string(path).map_err(|source| Error::CookieFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(cookie.trim().to_string())
}
