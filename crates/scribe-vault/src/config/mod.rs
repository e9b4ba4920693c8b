mod autosave_config;
#[allow(clippy::module_inception)]
mod config;
mod storage_config;
mod transcriber_config;

pub(crate) use {
    autosave_config::AutosaveConfig, config::Config, storage_config::StorageConfig,
    transcriber_config::TranscriberConfig,
};

pub(crate) const DEFAULT_AUTOSAVE_ENABLED: bool = true;
pub(crate) const DEFAULT_INTERVAL_SECS: u64 = 30;
pub(crate) const DEFAULT_MODEL: &str = "whisper-tiny";

pub(crate) fn default_autosave_enabled() -> bool {
    DEFAULT_AUTOSAVE_ENABLED
}

pub(crate) fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

pub(crate) fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
