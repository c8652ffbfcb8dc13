use std::{fs, path::Path};

use grafana_context_server::{
    release::{self, Architecture, ArchiveKind, Os},
    settings::{self, DEFAULT_SETTINGS, INSTALLATION_INSTRUCTIONS},
    ConfigurationState, Environment, GrafanaContextServerSettings, LaunchDescriptor,
    ProcessEnvironment, CONTEXT_SERVER_ID, REPO_NAME,
};
use zed::settings::ContextServerSettings;
use zed_extension_api::{
    self as zed, Command, ContextServerConfiguration, ContextServerId, Project, Result,
};

struct GrafanaModelContextExtension {
    cached_binary_path: Option<String>,
}

impl GrafanaModelContextExtension {
    fn context_server_binary_path(&mut self) -> Result<String> {
        if let Some(path) = &self.cached_binary_path {
            if fs::metadata(path).is_ok_and(|stat| stat.is_file()) {
                return Ok(path.clone());
            }
        }

        let release = zed::latest_github_release(
            REPO_NAME,
            zed::GithubReleaseOptions {
                require_assets: true,
                pre_release: false,
            },
        )
        .map_err(|e| format!("failed to fetch latest {REPO_NAME} release: {e}"))?;

        let (platform, arch) = zed::current_platform();
        let (os, arch) = (os(platform), architecture(arch));
        let asset_name = release::asset_name(os, arch);
        let asset = release
            .assets
            .iter()
            .find(|asset| asset.name == asset_name)
            .ok_or_else(|| format!("no asset found matching {asset_name:?}"))?;

        let version_dir = release::version_dir(&release.version);
        fs::create_dir_all(&version_dir)
            .map_err(|e| format!("failed to create directory '{version_dir}': {e}"))?;
        let binary_path = release::binary_path(&release.version, os);

        if !fs::metadata(&binary_path).is_ok_and(|stat| stat.is_file()) {
            zed::download_file(
                &asset.download_url,
                &version_dir,
                downloaded_file_type(os.archive_kind()),
            )
            .map_err(|e| format!("failed to download file: {e}"))?;

            zed::make_file_executable(&binary_path)?;
            remove_stale_versions(Path::new("."), &version_dir)?;
        }

        self.cached_binary_path = Some(binary_path.clone());
        Ok(binary_path)
    }
}

/// Removes everything in `dir` except the current release's directory and
/// returns the names of the removed entries. Entries that cannot be removed
/// are left for the next install to retry.
fn remove_stale_versions(dir: &Path, version_dir: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("failed to list working directory {e}"))?
        .map(|entry| {
            entry
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .map_err(|e| format!("failed to load directory entry {e}"))
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    let mut removed = Vec::new();
    for entry in release::stale_entries(entries.iter().map(String::as_str), version_dir) {
        let path = dir.join(entry);
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if result.is_ok() {
            removed.push(entry.to_string());
        }
    }
    Ok(removed)
}

/// Resolves the configuration of one activation and only then asks for the
/// server binary, so a misconfigured server never downloads anything.
fn launch_command(
    settings: Option<zed::serde_json::Value>,
    environment: &impl Environment,
    binary_path: impl FnOnce() -> Result<String>,
) -> Result<Command> {
    let settings = GrafanaContextServerSettings::from_value(settings).map_err(|e| e.to_string())?;
    let mut state = ConfigurationState::default();
    let config = state
        .resolve(&settings, environment)
        .map_err(|e| e.to_string())?;

    let LaunchDescriptor { command, args, env } = LaunchDescriptor::new(binary_path()?, config);
    Ok(Command { command, args, env })
}

fn os(platform: zed::Os) -> Os {
    match platform {
        zed::Os::Mac => Os::Mac,
        zed::Os::Linux => Os::Linux,
        zed::Os::Windows => Os::Windows,
    }
}

fn architecture(arch: zed::Architecture) -> Architecture {
    match arch {
        zed::Architecture::Aarch64 => Architecture::Aarch64,
        zed::Architecture::X86 => Architecture::X86,
        zed::Architecture::X8664 => Architecture::X8664,
    }
}

fn downloaded_file_type(kind: ArchiveKind) -> zed::DownloadedFileType {
    match kind {
        ArchiveKind::GzipTar => zed::DownloadedFileType::GzipTar,
        ArchiveKind::Zip => zed::DownloadedFileType::Zip,
    }
}

impl zed::Extension for GrafanaModelContextExtension {
    fn new() -> Self {
        Self {
            cached_binary_path: None,
        }
    }

    fn context_server_command(
        &mut self,
        _context_server_id: &ContextServerId,
        project: &Project,
    ) -> Result<Command> {
        let settings = ContextServerSettings::for_project(CONTEXT_SERVER_ID, project)?;
        launch_command(settings.settings, &ProcessEnvironment, || {
            self.context_server_binary_path()
        })
    }

    fn context_server_configuration(
        &mut self,
        _context_server_id: &ContextServerId,
        _project: &Project,
    ) -> Result<Option<ContextServerConfiguration>> {
        let settings_schema = settings::settings_schema().map_err(|e| e.to_string())?;

        Ok(Some(ContextServerConfiguration {
            installation_instructions: INSTALLATION_INSTRUCTIONS.to_string(),
            default_settings: DEFAULT_SETTINGS.to_string(),
            settings_schema,
        }))
    }
}

zed::register_extension!(GrafanaModelContextExtension);
