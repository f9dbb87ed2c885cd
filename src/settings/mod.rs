//! The user's salary, budget, currency and alert preferences.

mod core;
mod store;

pub use core::{DEFAULT_CURRENCY, UserSettings, create_settings_table};
pub use store::SettingsStore;
