//! Model acquisition: fetch and unpack voice model archives.
//!
//! The worker calls [`ModelInstaller::ensure_installed`] before constructing an
//! engine. The production implementation, [`ArchiveInstaller`], downloads the
//! voice's `.tar.bz2` archive next to the install directory (reusing it when
//! already present) and extracts it in place. Everything here blocks; it only
//! ever runs on the worker thread.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};

use crate::error::VoiceError;
use crate::models::VoiceModel;

/// Ensures a voice model's files exist locally.
pub trait ModelInstaller: Send {
    /// Make `model` available on disk and return its install directory.
    ///
    /// `on_progress` receives short human-readable status lines. On failure,
    /// partial state is removed on a best-effort basis.
    fn ensure_installed(
        &self,
        model: &VoiceModel,
        on_progress: &mut dyn FnMut(String),
    ) -> Result<PathBuf, VoiceError>;
}

/// Downloads sherpa-onnx model archives over HTTP and unpacks them.
pub struct ArchiveInstaller {
    models_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl ArchiveInstaller {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Install into the models directory resolved from `explicit`, the
    /// environment, or the platform data directory, in that order.
    pub fn resolve(explicit: Option<&str>) -> Result<Self, VoiceError> {
        let resolution = speakeasy_core::paths::resolve_voice_models_dir(explicit)?;
        tracing::info!(
            path = %resolution.path.display(),
            source = ?resolution.source,
            "Resolved voice models directory"
        );
        Ok(Self::new(resolution.path))
    }

    /// Directory voices are installed into.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut dyn FnMut(String),
    ) -> anyhow::Result<()> {
        tracing::info!(url, dest = %dest.display(), "Downloading voice model archive");

        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        let total = response.content_length().unwrap_or(0);

        // Stream into a sibling file so an interrupted download is never
        // mistaken for a complete archive on the next attempt.
        let partial = dest.with_extension("part");
        let result = stream_to_file(&mut response, &partial, total, on_progress)
            .and_then(|written| {
                fs::rename(&partial, dest)
                    .with_context(|| format!("failed to move archive to {}", dest.display()))?;
                Ok(written)
            });

        match result {
            Ok(written) => {
                tracing::info!(
                    size_mb = written / 1_048_576,
                    dest = %dest.display(),
                    "Voice model archive downloaded"
                );
                Ok(())
            }
            Err(e) => {
                remove_file_best_effort(&partial);
                Err(e)
            }
        }
    }
}

impl ModelInstaller for ArchiveInstaller {
    fn ensure_installed(
        &self,
        model: &VoiceModel,
        on_progress: &mut dyn FnMut(String),
    ) -> Result<PathBuf, VoiceError> {
        let install_dir = model.install_dir(&self.models_dir);

        if model.is_installed(&self.models_dir) {
            tracing::debug!(path = %install_dir.display(), "Voice model already installed");
            return Ok(install_dir);
        }

        let acquisition = |source: anyhow::Error| VoiceError::Acquisition {
            name: model.id.0.clone(),
            source,
        };

        fs::create_dir_all(&self.models_dir)
            .with_context(|| format!("cannot create {}", self.models_dir.display()))
            .map_err(acquisition)?;

        on_progress(format!("Downloading {}...", model.id));

        let archive = model.archive_path(&self.models_dir);
        if archive.exists() {
            tracing::debug!(path = %archive.display(), "Reusing downloaded archive");
        } else {
            self.download(&model.archive_url, &archive, on_progress)
                .map_err(acquisition)?;
        }

        on_progress("Extracting...".to_string());

        if let Err(e) = extract_tar_bz2(&archive, &self.models_dir) {
            // A corrupt archive would fail again; drop it so a retry re-downloads.
            remove_file_best_effort(&archive);
            remove_dir_best_effort(&install_dir);
            return Err(acquisition(e));
        }

        if !model.is_installed(&self.models_dir) {
            return Err(acquisition(anyhow!(
                "archive did not contain {}",
                model.model_path(&self.models_dir).display()
            )));
        }

        tracing::info!(path = %install_dir.display(), "Voice model installed");
        Ok(install_dir)
    }
}

/// Copy `reader` into `path`, reporting whole-percent progress when `total` is known.
///
/// Returns the number of bytes written.
pub(crate) fn stream_to_file(
    reader: &mut dyn Read,
    path: &Path,
    total: u64,
    on_progress: &mut dyn FnMut(String),
) -> anyhow::Result<u64> {
    let mut file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut buf = vec![0u8; 64 * 1024];
    let mut written: u64 = 0;
    let mut last_percent = None;

    loop {
        let n = reader.read(&mut buf).context("download interrupted")?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .with_context(|| format!("cannot write {}", path.display()))?;
        written += n as u64;

        if total > 0 {
            let percent = (written.saturating_mul(100) / total).min(100);
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                on_progress(format!("Downloading: {percent}%"));
            }
        }
    }

    file.flush()?;
    Ok(written)
}

/// Unpack a `.tar.bz2` archive into `dest`.
pub(crate) fn extract_tar_bz2(archive: &Path, dest: &Path) -> anyhow::Result<()> {
    let file =
        File::open(archive).with_context(|| format!("cannot open {}", archive.display()))?;
    let decoder = bzip2::read::BzDecoder::new(BufReader::new(file));
    tar::Archive::new(decoder)
        .unpack(dest)
        .with_context(|| format!("failed to extract {}", archive.display()))?;
    tracing::info!(archive = %archive.display(), dest = %dest.display(), "Archive extracted");
    Ok(())
}

fn remove_file_best_effort(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "Could not remove file");
        }
    }
}

fn remove_dir_best_effort(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "Could not remove directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoiceModelId;

    fn fixture_model() -> VoiceModel {
        VoiceModel {
            id: VoiceModelId("Test Voice".to_string()),
            // Unroutable; tests that reach the network are a bug.
            archive_url: "http://127.0.0.1:9/vits-test.tar.bz2".to_string(),
            archive_name: "vits-test.tar.bz2".to_string(),
            dir_name: "vits-test".to_string(),
            model_file: "test.onnx".to_string(),
        }
    }

    /// Build `<dir>/<archive_name>` containing `vits-test/<files>`.
    fn write_fixture_archive(dir: &Path, model: &VoiceModel, files: &[(&str, &[u8])]) {
        let archive = File::create(model.archive_path(dir)).unwrap();
        let encoder = bzip2::write::BzEncoder::new(archive, bzip2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);
        for (name, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{}/{name}", model.dir_name), *contents)
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn installed_model_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let model = fixture_model();
        fs::create_dir_all(model.install_dir(dir.path())).unwrap();
        fs::write(model.model_path(dir.path()), b"onnx").unwrap();

        let installer = ArchiveInstaller::new(dir.path());
        let mut lines = Vec::new();
        let path = installer
            .ensure_installed(&model, &mut |line: String| lines.push(line))
            .unwrap();

        assert_eq!(path, model.install_dir(dir.path()));
        assert!(lines.is_empty(), "no progress expected, got {lines:?}");
    }

    #[test]
    fn existing_archive_is_extracted_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let model = fixture_model();
        write_fixture_archive(
            dir.path(),
            &model,
            &[("test.onnx", b"onnx"), ("tokens.txt", b"a 0\n")],
        );

        let installer = ArchiveInstaller::new(dir.path());
        let mut lines = Vec::new();
        installer
            .ensure_installed(&model, &mut |line: String| lines.push(line))
            .unwrap();

        assert!(model.is_installed(dir.path()));
        assert!(model.install_dir(dir.path()).join("tokens.txt").exists());
        assert_eq!(lines.last().map(String::as_str), Some("Extracting..."));
    }

    #[test]
    fn archive_without_model_file_is_an_acquisition_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = fixture_model();
        write_fixture_archive(dir.path(), &model, &[("tokens.txt", b"a 0\n")]);

        let installer = ArchiveInstaller::new(dir.path());
        let err = installer.ensure_installed(&model, &mut |_| {}).unwrap_err();
        assert!(matches!(err, VoiceError::Acquisition { .. }), "{err:?}");
    }

    #[test]
    fn corrupt_archive_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let model = fixture_model();
        fs::write(model.archive_path(dir.path()), b"not a bzip2 stream").unwrap();

        let installer = ArchiveInstaller::new(dir.path());
        let err = installer.ensure_installed(&model, &mut |_| {}).unwrap_err();

        assert!(matches!(err, VoiceError::Acquisition { .. }), "{err:?}");
        assert!(!model.archive_path(dir.path()).exists());
    }

    /// Serve one response that promises `advertised` bytes but sends only `body`.
    fn serve_truncated(body: &'static [u8], advertised: usize) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {advertised}\r\nConnection: close\r\n\r\n"
            );
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });
        format!("http://{addr}/vits-test.tar.bz2")
    }

    #[test]
    fn interrupted_download_leaves_no_archive_behind() {
        let dir = tempfile::tempdir().unwrap();
        let model = VoiceModel {
            archive_url: serve_truncated(b"BZh91AY&SY", 64 * 1024),
            ..fixture_model()
        };

        let installer = ArchiveInstaller::new(dir.path());
        let mut lines = Vec::new();
        let err = installer
            .ensure_installed(&model, &mut |line: String| lines.push(line))
            .unwrap_err();

        assert!(matches!(err, VoiceError::Acquisition { .. }), "{err:?}");
        let archive = model.archive_path(dir.path());
        assert!(!archive.exists());
        assert!(!archive.with_extension("part").exists());
        assert!(!lines.iter().any(|l| l == "Extracting..."), "{lines:?}");
    }

    #[test]
    fn stream_reports_each_percent_once() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; 200 * 1024];
        let mut reader = std::io::Cursor::new(data.clone());
        let mut lines = Vec::new();

        let written = stream_to_file(
            &mut reader,
            &dir.path().join("out.bin"),
            data.len() as u64,
            &mut |line: String| lines.push(line),
        )
        .unwrap();

        assert_eq!(written, data.len() as u64);
        assert_eq!(lines.last().map(String::as_str), Some("Downloading: 100%"));
        let mut deduped = lines.clone();
        deduped.dedup();
        assert_eq!(lines, deduped);
    }

    #[test]
    fn stream_without_length_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = std::io::Cursor::new(vec![1u8; 1024]);
        let mut lines = Vec::new();
        stream_to_file(&mut reader, &dir.path().join("out.bin"), 0, &mut |line: String| {
            lines.push(line);
        })
        .unwrap();
        assert!(lines.is_empty());
    }
}
