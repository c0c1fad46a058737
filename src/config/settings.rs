//! Configuration settings for pcf
//!
//! Defines the CLI arguments, the TOML config file and the runtime
//! configuration derived from both.

use crate::core::{UploadMode, DEFAULT_CONNECT_TIMEOUT};
use crate::error::{PcfError, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file location below the user config directory
pub const CONFIG_FILE: &str = "pcf/config.toml";

/// pcf - SHA-1 (S)FTP pastebin client
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pcf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload files over (S)FTP and print content-addressed URLs")]
#[command(long_about = r#"
pcf uploads files to an FTP or SFTP server and prints, for each file, the
configured output prefix followed by the SHA-1 of the uploaded bytes and
the original file extension.

Modes:
  ftp         anonymous FTP (default)
  sftp-anon   anonymous SFTP
  sftp-auth   password-authenticated SFTP

Examples:
  pcf notes.txt                 # Upload with the configured default mode
  pcf -s screenshot.png         # Anonymous SFTP
  pcf -a a.log b.log            # Authenticated SFTP, two files
  dmesg | pcf                   # Upload standard input
"#)]
pub struct CliArgs {
    /// Files to upload (none or "-" reads standard input)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Use anonymous FTP
    #[arg(short = 'f', long = "ftp")]
    pub ftp: bool,

    /// Use anonymous SFTP
    #[arg(short = 's', long = "sftp-anon")]
    pub sftp_anon: bool,

    /// Use authenticated SFTP
    #[arg(short = 'a', long = "sftp-auth")]
    pub sftp_auth: bool,

    /// Config file path
    #[arg(short = 'c', long, env = "PCF_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep uploading the remaining files after a failure
    #[arg(long)]
    pub continue_on_error: bool,

    /// Print the names that would be published without uploading
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Mode selected by flags; authenticated SFTP wins over anonymous SFTP,
    /// which wins over FTP
    pub fn mode_override(&self) -> Option<UploadMode> {
        if self.sftp_auth {
            Some(UploadMode::SftpAuthenticated)
        } else if self.sftp_anon {
            Some(UploadMode::SftpAnonymous)
        } else if self.ftp {
            Some(UploadMode::Ftp)
        } else {
            None
        }
    }

    /// Tracing filter directive for the verbosity count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Settings read from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// URL for anonymous FTP uploads
    pub ftp_url: String,
    /// URL for anonymous SFTP uploads
    pub sftp_anon_url: String,
    /// URL for authenticated SFTP uploads
    pub sftp_auth_url: String,
    /// Username for authenticated SFTP uploads
    pub sftp_user: String,
    /// Password for authenticated SFTP uploads
    pub sftp_pass: String,
    /// "ftp", "sftp-anon" or "sftp-auth"; anything else means "ftp"
    pub default_mode: String,
    /// Prefix printed before every published name, typically a URL
    pub output: String,
}

impl FileConfig {
    /// `<user config dir>/pcf/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .ok_or_else(|| PcfError::config("failed locating user config directory"))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PcfError::config(format!("failed opening config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&text).map_err(|e| {
            PcfError::config(format!("failed parsing config file {}: {}", path.display(), e))
        })
    }

    /// Configured default mode
    pub fn default_mode(&self) -> UploadMode {
        UploadMode::from_name(&self.default_mode)
    }

    /// Upload URL configured for `mode`
    pub fn url_for(&self, mode: UploadMode) -> &str {
        match mode {
            UploadMode::Ftp => &self.ftp_url,
            UploadMode::SftpAnonymous => &self.sftp_anon_url,
            UploadMode::SftpAuthenticated => &self.sftp_auth_url,
        }
    }

    fn url_key(mode: UploadMode) -> &'static str {
        match mode {
            UploadMode::Ftp => "ftp_url",
            UploadMode::SftpAnonymous => "sftp_anon_url",
            UploadMode::SftpAuthenticated => "sftp_auth_url",
        }
    }
}

/// Runtime configuration derived from CLI args and the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Selected upload mode
    pub mode: UploadMode,
    /// Upload URL for the selected mode
    pub url: String,
    /// Explicit username (used only in authenticated SFTP mode)
    pub user: String,
    /// Explicit password (used only in authenticated SFTP mode)
    pub password: String,
    /// Prefix of every printed name
    pub output_prefix: String,
    /// Skip failed files instead of stopping at the first one
    pub continue_on_error: bool,
    /// Hash without uploading
    pub dry_run: bool,
    /// Dial timeout for FTP and SSH connections
    pub connect_timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            mode: UploadMode::Ftp,
            url: String::new(),
            user: String::new(),
            password: String::new(),
            output_prefix: String::new(),
            continue_on_error: false,
            dry_run: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl UploadConfig {
    /// Create config from CLI arguments and the config file
    pub fn from_cli(args: &CliArgs, file: &FileConfig) -> Result<Self> {
        let mode = args.mode_override().unwrap_or_else(|| file.default_mode());

        let url = file.url_for(mode);
        if url.is_empty() {
            return Err(PcfError::config(format!(
                "no upload URL configured for mode {} (set {})",
                mode,
                FileConfig::url_key(mode)
            )));
        }

        Ok(Self {
            mode,
            url: url.to_string(),
            user: file.sftp_user.clone(),
            password: file.sftp_pass.clone(),
            output_prefix: file.output.clone(),
            continue_on_error: args.continue_on_error,
            dry_run: args.dry_run,
            ..Default::default()
        })
    }
}
