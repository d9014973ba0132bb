pub mod body;
pub mod disposition;

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::portal::Portal;
use crate::session::Session;

use body::VideoBody;

/// The `media/` tree videos are written into.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn session_dir(&self, session: &Session) -> PathBuf {
        self.root.join(session.folder())
    }

    /// Creates the session's folder and any missing parents.
    pub fn prepare(&self, session: &Session) -> Result<PathBuf> {
        let folder = self.session_dir(session);

        std::fs::create_dir_all(&folder).map_err(|source| Error::Io {
            path: folder.clone(),
            source,
        })?;

        Ok(folder)
    }

    /// Streams `body` into `folder/file_name`, replacing any file already there.
    pub async fn write(&self, folder: &Path, file_name: &str, body: &mut dyn VideoBody) -> Result<PathBuf> {
        let path = folder.join(file_name);
        let io_error = |source| Error::Io {
            path: path.clone(),
            source,
        };

        let mut file = std::fs::File::create(&path).map_err(io_error)?;

        while let Some(chunk) = body.next_chunk().await? {
            file.write_all(&chunk).map_err(io_error)?;
        }

        file.flush().map_err(io_error)?;

        Ok(path)
    }
}

/// Downloads every resolved video, one after another.
pub async fn download_sessions<P: Portal + ?Sized>(portal: &P, sessions: &[Session], store: &MediaStore) -> Result<()> {
    for session in sessions.iter().filter(|session| !session.video_urls.is_empty()) {
        info!(
            "Downloading {} videos from session {}",
            session.video_urls.len(),
            session.session_time
        );

        let folder = store.prepare(session)?;

        for url in &session.video_urls {
            info!("Downloading {}", url);

            let mut response = portal.video(url).await?;
            let file_name = response
                .content_disposition
                .as_deref()
                .and_then(disposition::filename)
                .ok_or_else(|| Error::MissingFilename(url.clone()))?;

            store.write(&folder, &file_name, response.body.as_mut()).await?;

            info!("Downloaded {} successfully to {}", file_name, folder.display());
        }
    }

    Ok(())
}
