//! Naming of `mcp-grafana` GitHub release assets and their install layout.
//!
//! Releases ship one archive per platform, named
//! `mcp-grafana_{Os}_{arch}.{tar.gz|zip}`. Each release is extracted into its
//! own `mcp-grafana-{version}` directory inside the extension's working
//! directory; older directories are removed once a newer one is installed.

use crate::BINARY_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Mac,
    Linux,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Aarch64,
    X86,
    X8664,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    GzipTar,
    Zip,
}

impl Os {
    fn release_name(self) -> &'static str {
        match self {
            Os::Mac => "Darwin",
            Os::Linux => "Linux",
            Os::Windows => "Windows",
        }
    }

    pub fn archive_kind(self) -> ArchiveKind {
        match self {
            Os::Mac | Os::Linux => ArchiveKind::GzipTar,
            Os::Windows => ArchiveKind::Zip,
        }
    }
}

impl Architecture {
    fn release_name(self) -> &'static str {
        match self {
            Architecture::Aarch64 => "arm64",
            Architecture::X86 => "i386",
            Architecture::X8664 => "x86_64",
        }
    }
}

impl ArchiveKind {
    fn extension(self) -> &'static str {
        match self {
            ArchiveKind::GzipTar => "tar.gz",
            ArchiveKind::Zip => "zip",
        }
    }
}

pub fn asset_name(os: Os, arch: Architecture) -> String {
    format!(
        "{BINARY_NAME}_{os}_{arch}.{ext}",
        os = os.release_name(),
        arch = arch.release_name(),
        ext = os.archive_kind().extension(),
    )
}

pub fn version_dir(version: &str) -> String {
    format!("{BINARY_NAME}-{version}")
}

pub fn binary_path(version: &str, os: Os) -> String {
    let suffix = match os {
        Os::Windows => ".exe",
        Os::Mac | Os::Linux => "",
    };
    format!("{}/{BINARY_NAME}{suffix}", version_dir(version))
}

/// Entries of the working directory that belong to other releases.
pub fn stale_entries<'a>(
    entries: impl IntoIterator<Item = &'a str>,
    current_version_dir: &str,
) -> Vec<&'a str> {
    entries
        .into_iter()
        .filter(|entry| *entry != current_version_dir)
        .collect()
}
