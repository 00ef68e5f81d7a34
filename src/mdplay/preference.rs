//! Theme preference synchronization.
//!
//! One value, three views: the ambient color scheme, the durable `theme`
//! setting, and the live value the presentation layer reads. The durable
//! record wins when present. Otherwise the ambient scheme decides and is
//! persisted right away so later sessions take the stored branch.
//!
//! User changes are optimistic. The live value and targets update first;
//! a failed write is reported but never rolled back.

use crate::error::Result;
use crate::model::{Setting, SettingKey, Theme};
use crate::store::{RecordStore, StorageBackend};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Environment override for the ambient scheme, `light` or `dark`.
pub const SCHEME_ENV: &str = "MDPLAY_COLOR_SCHEME";

/// Source of the default theme when nothing is stored.
pub trait AmbientScheme: Send + Sync {
    fn preferred(&self) -> Theme;
}

impl<A: AmbientScheme + ?Sized> AmbientScheme for Arc<A> {
    fn preferred(&self) -> Theme {
        (**self).preferred()
    }
}

/// `$MDPLAY_COLOR_SCHEME`, falling back to the desktop's light/dark mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemScheme;

impl AmbientScheme for SystemScheme {
    fn preferred(&self) -> Theme {
        if let Ok(value) = std::env::var(SCHEME_ENV) {
            match value.parse() {
                Ok(theme) => return theme,
                Err(_) => warn!(value = %value, "ignoring invalid {}", SCHEME_ENV),
            }
        }
        match dark_light::detect() {
            dark_light::Mode::Dark => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

/// A fixed ambient answer, for tests and headless use.
#[derive(Debug, Clone, Copy)]
pub struct FixedScheme(pub Theme);

impl AmbientScheme for FixedScheme {
    fn preferred(&self) -> Theme {
        self.0
    }
}

/// Something that displays the theme, like the `data-theme` root attribute.
pub trait ThemeTarget: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// Holds the value of a document root's `data-theme` attribute.
#[derive(Debug, Default)]
pub struct RootAttribute {
    value: Mutex<Option<Theme>>,
}

impl RootAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Theme> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThemeTarget for RootAttribute {
    fn apply(&self, theme: Theme) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(theme);
    }
}

pub struct ThemeSync<'s, B: StorageBackend> {
    store: &'s RecordStore<B>,
    ambient: Box<dyn AmbientScheme>,
    targets: Vec<Arc<dyn ThemeTarget>>,
    live: watch::Sender<Theme>,
}

impl<'s, B: StorageBackend> ThemeSync<'s, B> {
    /// Starts at [`Theme::Light`] until [`ThemeSync::initialize`] runs.
    pub fn new(store: &'s RecordStore<B>, ambient: impl AmbientScheme + 'static) -> Self {
        let (live, _) = watch::channel(Theme::Light);
        Self {
            store,
            ambient: Box::new(ambient),
            targets: Vec::new(),
            live,
        }
    }

    pub fn with_target(mut self, target: Arc<dyn ThemeTarget>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn current(&self) -> Theme {
        *self.live.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.live.subscribe()
    }

    fn publish(&self, theme: Theme) {
        self.live.send_replace(theme);
        for target in &self.targets {
            target.apply(theme);
        }
    }

    /// Resolve the starting theme: stored value, else ambient default (persisted).
    ///
    /// On a store error the ambient default is still adopted for the session
    /// and the error is returned for the caller to log.
    pub async fn initialize(&self) -> Result<Theme> {
        let stored = match self.store.get_setting(SettingKey::Theme).await {
            Ok(stored) => stored,
            Err(e) => {
                let fallback = self.ambient.preferred();
                warn!(error = %e, theme = %fallback, "could not read theme, using ambient default");
                self.publish(fallback);
                return Err(e);
            }
        };

        if let Some(setting) = stored {
            debug!(theme = %setting.value, "using stored theme");
            self.publish(setting.value);
            return Ok(setting.value);
        }

        let theme = self.ambient.preferred();
        info!(theme = %theme, "no stored theme, adopting ambient default");
        self.publish(theme);
        self.store.put_setting(&Setting::theme(theme)).await?;
        Ok(theme)
    }

    /// Show `theme` immediately, then persist it.
    pub async fn set(&self, theme: Theme) -> Result<Theme> {
        self.publish(theme);
        if let Err(e) = self.store.put_setting(&Setting::theme(theme)).await {
            warn!(error = %e, theme = %theme, "theme not saved, keeping it for this session");
            return Err(e);
        }
        Ok(theme)
    }

    pub async fn toggle(&self) -> Result<Theme> {
        self.set(self.current().toggled()).await
    }
}
