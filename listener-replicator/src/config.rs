use listener_config::load_config;
use listener_config::shared::ListenerConfig;

/// Loads the [`ListenerConfig`] and validates it.
pub fn load_listener_config() -> anyhow::Result<ListenerConfig> {
    let config = load_config::<ListenerConfig>()?;
    config.validate()?;

    Ok(config)
}
