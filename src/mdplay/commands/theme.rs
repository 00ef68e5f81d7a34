use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Theme;
use crate::preference::{AmbientScheme, ThemeSync};
use crate::store::{RecordStore, StorageBackend};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set(Theme),
}

pub async fn run<B: StorageBackend>(
    store: &RecordStore<B>,
    ambient: Arc<dyn AmbientScheme>,
    action: ThemeAction,
) -> Result<CmdResult> {
    let sync = ThemeSync::new(store, ambient);
    let mut result = CmdResult::default();
    let initialized = sync.initialize().await.map(|_| ());
    result.tolerate(initialized, "Theme")?;

    let theme = match action {
        ThemeAction::Show => sync.current(),
        ThemeAction::Toggle | ThemeAction::Set(_) => {
            let target = match action {
                ThemeAction::Set(theme) => theme,
                _ => sync.current().toggled(),
            };
            match sync.set(target).await {
                Ok(theme) => {
                    result.add_message(CmdMessage::success(format!("Theme set to {}", theme)))
                }
                Err(e) => result.tolerate(Err(e), "Theme")?,
            }
            sync.current()
        }
    };
    Ok(result.with_theme(theme))
}
