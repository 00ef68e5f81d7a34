use crate::commands::{CmdMessage, CmdResult};
use crate::config::{PlaygroundConfig, PlaygroundPaths};
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

fn lookup(config: &PlaygroundConfig, key: &str) -> Option<String> {
    config
        .entries()
        .into_iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

pub fn run(paths: &PlaygroundPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.data_dir;
    match action {
        ConfigAction::ShowAll => {
            let config = PlaygroundConfig::load(dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = PlaygroundConfig::load(dir)?;
            let mut result = CmdResult::default();
            match lookup(&config, &key) {
                Some(value) => result.add_message(CmdMessage::info(value)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = PlaygroundConfig::load(dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut result = CmdResult::default();
                result.add_message(CmdMessage::error(e.to_string()));
                return Ok(result);
            }
            config.save(dir)?;
            let shown = lookup(&config, &key).unwrap_or(value);
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, shown)));
            Ok(result)
        }
    }
}
