//! Upload orchestrator
//!
//! Uploads sources one after another in the order given. Each source is
//! read exactly once: a [`TeeReader`] feeds the SHA-1 hasher while the
//! transport consumes the stream, and the published name is printed as
//! soon as the upload succeeds.

use crate::config::UploadConfig;
use crate::core::{NetworkTransport, Transport, UploadRequest, UploadTarget};
use crate::error::{IoResultExt, PcfError, Result};
use crate::hash::{compose_name, HashResult, StreamingHasher, TeeReader};
use rand::Rng;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Destination name used for standard input
pub const STDIN_NAME: &str = "file";

/// Length of the random name used when a path has no usable base name
const FALLBACK_NAME_LEN: usize = 5;

/// Random latin string of `len` letters
pub fn random_name(len: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// Where an upload reads its bytes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// A local file
    Path(PathBuf),
    /// Standard input
    Stdin,
}

impl UploadSource {
    /// Map positional arguments; no arguments or `-` mean standard input
    pub fn from_args(paths: &[PathBuf]) -> Vec<Self> {
        if paths.is_empty() {
            return vec![Self::Stdin];
        }

        paths
            .iter()
            .map(|path| {
                if path.as_os_str() == "-" {
                    Self::Stdin
                } else {
                    Self::Path(path.clone())
                }
            })
            .collect()
    }

    /// Name to store the content under on the server
    pub fn destination_name(&self) -> String {
        match self {
            Self::Stdin => STDIN_NAME.to_string(),
            Self::Path(path) => match path.file_name() {
                Some(name) if !name.is_empty() => name.to_string_lossy().into_owned(),
                _ => random_name(FALLBACK_NAME_LEN),
            },
        }
    }

    /// Path whose extension ends up in the published name
    pub fn naming_path(&self) -> &Path {
        match self {
            Self::Stdin => Path::new(STDIN_NAME),
            Self::Path(path) => path,
        }
    }

    /// Label that local read errors are reported against
    pub fn local_path(&self) -> &Path {
        match self {
            Self::Stdin => Path::new("<stdin>"),
            Self::Path(path) => path,
        }
    }

    fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin().lock())),
            Self::Path(path) => Ok(Box::new(File::open(path).with_path(path)?)),
        }
    }
}

impl fmt::Display for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A successfully uploaded source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Source as given on the command line
    pub source: String,
    /// Published, digest-derived name
    pub name: String,
    /// SHA-1 of the transmitted bytes
    pub digest: HashResult,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Uploaded sources in input order
    pub uploaded: Vec<UploadedFile>,
    /// Sources that failed, with their errors (only with continue-on-error)
    pub failures: Vec<(String, PcfError)>,
    /// Total duration
    pub duration: Duration,
}

impl UploadReport {
    /// Check if every source was uploaded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total bytes transmitted
    pub fn bytes_uploaded(&self) -> u64 {
        self.uploaded.iter().map(|file| file.digest.size).sum()
    }

    /// Turn collected failures into a single error
    pub fn into_result(self) -> Result<Vec<UploadedFile>> {
        if self.failures.is_empty() {
            return Ok(self.uploaded);
        }

        let errors: Vec<PcfError> = self.failures.into_iter().map(|(_, e)| e).collect();
        Err(PcfError::MultipleErrors {
            count: errors.len(),
            errors,
        })
    }

    /// Log a one-line summary
    pub fn log_summary(&self) {
        info!(
            uploaded = self.uploaded.len(),
            failed = self.failures.len(),
            "transferred {} in {:.2?}",
            humansize::format_size(self.bytes_uploaded(), humansize::BINARY),
            self.duration
        );
    }
}

/// Uploads sources sequentially and prints their published names
pub struct Uploader<T = NetworkTransport> {
    config: UploadConfig,
    target: UploadTarget,
    transport: T,
}

impl Uploader<NetworkTransport> {
    /// Create an uploader that talks to the configured server
    pub fn new(config: UploadConfig) -> Result<Self> {
        let transport = NetworkTransport::new(config.connect_timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Uploader<T> {
    /// Create an uploader with a custom transport
    pub fn with_transport(config: UploadConfig, transport: T) -> Result<Self> {
        let target = UploadTarget::parse(&config.url)?;
        Ok(Self {
            config,
            target,
            transport,
        })
    }

    /// Runtime configuration
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload every source in order, writing one published name per line to `out`.
    ///
    /// The first failure ends the run unless `continue_on_error` is set, in
    /// which case failures are collected in the report.
    pub fn upload_all<W: Write>(
        &self,
        sources: &[UploadSource],
        out: &mut W,
    ) -> Result<UploadReport> {
        let start = Instant::now();
        let mut report = UploadReport::default();

        for source in sources {
            match self.upload_source(source) {
                Ok(file) => {
                    writeln!(out, "{}", file.name)
                        .and_then(|_| out.flush())
                        .with_path("<stdout>")?;
                    report.uploaded.push(file);
                }
                Err(e) => {
                    let e = e.with_context(format!("failed uploading {}", source));
                    if !self.config.continue_on_error {
                        return Err(e);
                    }
                    warn!("{}", e);
                    report.failures.push((source.to_string(), e));
                }
            }
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    /// Open, upload and name a single source
    pub fn upload_source(&self, source: &UploadSource) -> Result<UploadedFile> {
        let reader = source.open()?;
        let name = source.destination_name();
        let digest = self.upload_reader(reader, &name, source.local_path())?;

        Ok(UploadedFile {
            source: source.to_string(),
            name: compose_name(&self.config.output_prefix, &digest, source.naming_path()),
            digest,
        })
    }

    /// Upload `reader` as `name` and return the digest of the bytes sent.
    ///
    /// A failed read of `reader` is reported as an I/O error at `local_path`,
    /// whatever the transport made of it.
    pub fn upload_reader<R: Read>(
        &self,
        reader: R,
        name: &str,
        local_path: &Path,
    ) -> Result<HashResult> {
        let mut tee = TeeReader::new(reader, StreamingHasher::new());

        let request = UploadRequest::new(
            self.config.mode,
            self.target.clone(),
            &self.config.user,
            &self.config.password,
            name,
            &mut tee,
        )?;
        let result = request.upload_with(&self.transport);

        if let Some(e) = tee.take_read_error() {
            return Err(PcfError::io(local_path, e));
        }
        let sent = result?;

        let digest = tee.into_hasher().finalize();

        if sent != digest.size {
            return Err(PcfError::remote(
                self.target.remote_path(name),
                format!("sent {} bytes but hashed {}", sent, digest.size),
            ));
        }

        debug!(name, digest = %digest, "upload complete");
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UploadMode;
    use crate::hash::{hash_bytes, hash_file};
    use std::cell::RefCell;
    use tempfile::TempDir;

    const PREFIX: &str = "https://paste.example.org/";

    /// In-memory transport that records what it receives
    #[derive(Default)]
    struct MockTransport {
        fail_on_call: Option<usize>,
        calls: RefCell<usize>,
        received: RefCell<Vec<(String, Vec<u8>)>>,
    }

    impl MockTransport {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Default::default()
            }
        }
    }

    impl Transport for MockTransport {
        fn upload(&self, mut request: UploadRequest<'_>) -> Result<u64> {
            *self.calls.borrow_mut() += 1;
            if self.fail_on_call == Some(*self.calls.borrow()) {
                return Err(PcfError::connection("mock:21", "connection refused"));
            }

            // Read failures surface as remote errors, like the network drivers
            let path = request.remote_path();
            let mut data = Vec::new();
            request
                .content()
                .read_to_end(&mut data)
                .map_err(|e| PcfError::remote(&path, e.to_string()))?;
            let len = data.len() as u64;
            self.received.borrow_mut().push((request.remote_path(), data));
            Ok(len)
        }
    }

    fn config(mode: UploadMode) -> UploadConfig {
        UploadConfig {
            mode,
            url: "ftp://paste.example.org/incoming".to_string(),
            output_prefix: PREFIX.to_string(),
            ..Default::default()
        }
    }

    fn write_files(dir: &TempDir) -> Vec<UploadSource> {
        [("one.txt", &b"first"[..]), ("two.png", b"second"), ("three", b"third")]
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                std::fs::write(&path, content).unwrap();
                UploadSource::Path(path)
            })
            .collect()
    }

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_uploads_in_order_and_prints_names() {
        let dir = TempDir::new().unwrap();
        let sources = write_files(&dir);
        let uploader = Uploader::with_transport(config(UploadMode::Ftp), MockTransport::default())
            .unwrap();

        let mut out = Vec::new();
        let report = uploader.upload_all(&sources, &mut out).unwrap();

        assert!(report.is_success());
        assert_eq!(report.bytes_uploaded(), 16);
        assert_eq!(
            lines(&out),
            vec![
                format!("{}{}.txt", PREFIX, hash_bytes(b"first").hash),
                format!("{}{}.png", PREFIX, hash_bytes(b"second").hash),
                format!("{}{}", PREFIX, hash_bytes(b"third").hash),
            ]
        );

        let received = uploader.transport.received.borrow();
        let paths: Vec<&str> = received.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["/incoming/one.txt", "/incoming/two.png", "/incoming/three"]);
    }

    #[test]
    fn test_fail_fast_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let sources = write_files(&dir);
        let uploader =
            Uploader::with_transport(config(UploadMode::Ftp), MockTransport::failing_on(2))
                .unwrap();

        let mut out = Vec::new();
        let err = uploader.upload_all(&sources, &mut out).unwrap_err();

        assert!(err.is_connection_error());
        assert!(err.to_string().contains("two.png"));
        assert_eq!(lines(&out).len(), 1);
        assert_eq!(*uploader.transport.calls.borrow(), 2);
        assert_eq!(uploader.transport.received.borrow().len(), 1);
    }

    #[test]
    fn test_continue_on_error_keeps_order() {
        let dir = TempDir::new().unwrap();
        let sources = write_files(&dir);
        let mut cfg = config(UploadMode::Ftp);
        cfg.continue_on_error = true;
        let uploader = Uploader::with_transport(cfg, MockTransport::failing_on(2)).unwrap();

        let mut out = Vec::new();
        let report = uploader.upload_all(&sources, &mut out).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.ends_with("two.png"));
        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(
            lines(&out),
            vec![
                format!("{}{}.txt", PREFIX, hash_bytes(b"first").hash),
                format!("{}{}", PREFIX, hash_bytes(b"third").hash),
            ]
        );

        match report.into_result().unwrap_err() {
            PcfError::MultipleErrors { count, errors } => {
                assert_eq!(count, 1);
                assert!(errors[0].is_connection_error());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_printed_digest_matches_local_copy_and_wire_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..1_000_003u32).map(|i| (i * 31 % 256) as u8).collect();
        std::fs::write(&path, &data).unwrap();
        let local = hash_file(&path).unwrap();

        let uploader = Uploader::with_transport(config(UploadMode::Ftp), MockTransport::default())
            .unwrap();
        let file = uploader.upload_source(&UploadSource::Path(path)).unwrap();

        assert_eq!(file.digest, local);
        assert_eq!(file.name, format!("{}{}.bin", PREFIX, local.hash));
        let received = uploader.transport.received.borrow();
        assert_eq!(hash_bytes(&received[0].1), local);
    }

    #[test]
    fn test_missing_password_fails_before_transport() {
        let dir = TempDir::new().unwrap();
        let sources = write_files(&dir);
        let mut cfg = config(UploadMode::SftpAuthenticated);
        cfg.url = "sftp://paste.example.org/srv".to_string();
        let uploader = Uploader::with_transport(cfg, MockTransport::default()).unwrap();

        let mut out = Vec::new();
        let err = uploader.upload_all(&sources, &mut out).unwrap_err();

        assert!(err.is_credential_error());
        assert!(out.is_empty());
        assert_eq!(*uploader.transport.calls.borrow(), 0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.txt");
        let uploader = Uploader::with_transport(config(UploadMode::Ftp), MockTransport::default())
            .unwrap();

        let mut out = Vec::new();
        let err = uploader
            .upload_all(&[UploadSource::Path(missing.clone())], &mut out)
            .unwrap_err();

        assert_eq!(err.path(), Some(&missing));
        assert_eq!(*uploader.transport.calls.borrow(), 0);
    }

    #[test]
    fn test_read_error_during_upload_names_local_source() {
        struct FailAfterFirstChunk(bool);
        impl Read for FailAfterFirstChunk {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "disk gone"));
                }
                self.0 = true;
                buf[0] = b'x';
                Ok(1)
            }
        }

        let uploader = Uploader::with_transport(config(UploadMode::Ftp), MockTransport::default())
            .unwrap();
        let local = Path::new("/data/a.txt");
        let err = uploader
            .upload_reader(FailAfterFirstChunk(false), "a.txt", local)
            .unwrap_err();

        assert!(matches!(err, PcfError::Io { .. }));
        assert_eq!(err.path().map(PathBuf::as_path), Some(local));
        assert!(err.to_string().contains("disk gone"));
        assert!(uploader.transport.received.borrow().is_empty());
    }

    #[test]
    fn test_invalid_url_rejected_at_construction() {
        let mut cfg = config(UploadMode::Ftp);
        cfg.url = "paste.example.org/incoming".to_string();
        assert!(Uploader::with_transport(cfg, MockTransport::default()).is_err());
    }

    #[test]
    fn test_sources_from_args() {
        assert_eq!(UploadSource::from_args(&[]), vec![UploadSource::Stdin]);
        assert_eq!(
            UploadSource::from_args(&[PathBuf::from("a.txt"), PathBuf::from("-")]),
            vec![UploadSource::Path(PathBuf::from("a.txt")), UploadSource::Stdin]
        );
    }

    #[test]
    fn test_destination_names() {
        assert_eq!(UploadSource::Stdin.destination_name(), "file");
        assert_eq!(
            UploadSource::Path(PathBuf::from("/tmp/dir/report.pdf")).destination_name(),
            "report.pdf"
        );

        let fallback = UploadSource::Path(PathBuf::from("/tmp/..")).destination_name();
        assert_eq!(fallback.len(), 5);
        assert!(fallback.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_stdin_name_has_no_extension() {
        let uploader = Uploader::with_transport(config(UploadMode::Ftp), MockTransport::default())
            .unwrap();
        let digest = uploader
            .upload_reader(&b"piped"[..], STDIN_NAME, UploadSource::Stdin.local_path())
            .unwrap();
        let name = compose_name(PREFIX, &digest, UploadSource::Stdin.naming_path());
        assert_eq!(name, format!("{}{}", PREFIX, hash_bytes(b"piped").hash));
        assert_eq!(
            uploader.transport.received.borrow()[0].0,
            "/incoming/file"
        );
    }

    #[test]
    fn test_random_name() {
        let name = random_name(12);
        assert_eq!(name.len(), 12);
        assert!(name.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
