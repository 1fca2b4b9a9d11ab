use crate::{
    config::{CategoryView, StoredConfig},
    watcher::PlaybackWatcher,
};

/// What a configuration update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    pub auto_skip_changed: bool,
    pub categories_changed: bool,
    pub colors_changed: bool,
}

impl ConfigChange {
    pub fn is_empty(&self) -> bool {
        *self == ConfigChange::default()
    }
}

/// Applies configuration updates to live watcher state without a reset.
#[derive(Debug, Default)]
pub struct ConfigReactor {
    view: CategoryView,
}

impl ConfigReactor {
    pub fn new(config: &StoredConfig) -> Self {
        Self {
            view: CategoryView::derive(config),
        }
    }

    pub fn view(&self) -> &CategoryView {
        &self.view
    }

    /// Apply `config`. The auto-skip flag takes effect on the watcher
    /// immediately; a changed visible set is reported so the caller can
    /// re-resolve segments.
    pub fn apply(&mut self, config: &StoredConfig, watcher: &mut PlaybackWatcher) -> ConfigChange {
        let auto_skip_changed = watcher.state().auto_skip_enabled != config.auto_skip_enabled;
        watcher.set_auto_skip(config.auto_skip_enabled);

        let next = CategoryView::derive(config);
        let change = ConfigChange {
            auto_skip_changed,
            categories_changed: next.visible_categories() != self.view.visible_categories(),
            colors_changed: next.colors() != self.view.colors(),
        };
        self.view = next;
        change
    }
}
