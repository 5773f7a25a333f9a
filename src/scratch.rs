use std::path::{Path, PathBuf};

use uuid::Uuid;

pub const VIDEO_PREFIX: &str = "video_temp";
pub const AUDIO_PREFIX: &str = "audio_temp";

/// Per-request temporary directories for the separate audio and video
/// downloads, under the media root.
///
/// Nothing is created on disk by this type; the directories appear when the
/// downloads create them. Both are removed by [`Scratch::release`] or, if the
/// owning future is cancelled first, when the guard is dropped. Inside a
/// runtime the drop hands the removal to the blocking pool.
#[derive(Debug)]
pub struct Scratch {
    video: PathBuf,
    audio: PathBuf,
    released: bool,
}

impl Scratch {
    pub fn new(root: &Path) -> Self {
        let token = Uuid::new_v4().simple().to_string();

        Self {
            video: root.join(format!("{}-{}", VIDEO_PREFIX, token)),
            audio: root.join(format!("{}-{}", AUDIO_PREFIX, token)),
            released: false,
        }
    }

    pub fn video_dir(&self) -> &Path {
        &self.video
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio
    }

    /// Removes both directories and their files. A failure on one does not
    /// stop the other; failures are logged, not returned.
    pub async fn release(mut self) {
        self.released = true;

        for dir in [&self.video, &self.audio] {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => (),
                Err(e) => warn!("Could not remove {}: {}", dir.display(), e),
            }
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let dirs = [self.video.clone(), self.audio.clone()];
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_dirs(&dirs));
            }
            Err(_) => remove_dirs(&dirs),
        }
    }
}

fn remove_dirs(dirs: &[PathBuf]) {
    for dir in dirs {
        if !dir.exists() {
            continue;
        }
        if let Err(e) = std::fs::remove_dir_all(dir) {
            warn!("Could not remove {}: {}", dir.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(scratch: &Scratch) {
        for dir in [scratch.video_dir(), scratch.audio_dir()] {
            std::fs::create_dir_all(dir).unwrap();
            std::fs::write(dir.join("part.mp4"), b"data").unwrap();
        }
    }

    #[test]
    fn names_are_unique_per_request() {
        let root = Path::new("/library");
        let a = Scratch::new(root);
        let b = Scratch::new(root);

        assert_ne!(a.video_dir(), b.video_dir());
        assert_ne!(a.audio_dir(), b.audio_dir());
        assert!(a.video_dir().starts_with(root));
        assert!(a
            .video_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("video_temp-"));
        assert!(a
            .audio_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("audio_temp-"));
    }

    #[tokio::test]
    async fn release_removes_files_and_dirs() {
        let root = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(root.path());
        populate(&scratch);
        let (video, audio) = (scratch.video_dir().to_owned(), scratch.audio_dir().to_owned());

        scratch.release().await;

        assert!(!video.exists());
        assert!(!audio.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn release_without_dirs_is_fine() {
        let root = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(root.path());
        std::fs::create_dir_all(scratch.audio_dir()).unwrap();

        scratch.release().await;

        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn drop_inside_runtime_removes_dirs() {
        let root = tempfile::tempdir().unwrap();
        drop({
            let scratch = Scratch::new(root.path());
            populate(&scratch);
            scratch
        });

        for _ in 0..100 {
            if std::fs::read_dir(root.path()).unwrap().count() == 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("scratch directories still present");
    }

    #[test]
    fn drop_removes_dirs() {
        let root = tempfile::tempdir().unwrap();
        {
            let scratch = Scratch::new(root.path());
            populate(&scratch);
        }

        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
