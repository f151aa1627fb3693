use std::sync::LazyLock;

use derive_from_env::FromEnv;

#[derive(FromEnv, Default)]
#[from_env(prefix = "CATLOG")]
#[allow(non_snake_case)]
pub struct CatLogConfig {
    /// Overrides the console sink template when non-empty.
    #[from_env(default = "")]
    pub MESSAGE_PATTERN: String,
    /// Default category of the process-wide router when non-empty.
    #[from_env(default = "")]
    pub DEFAULT_CATEGORY: String,
}

pub static CATLOG_CONFIG: LazyLock<CatLogConfig> =
    LazyLock::new(|| CatLogConfig::from_env().unwrap_or_default());

impl CatLogConfig {
    pub fn message_pattern(&self) -> Option<&str> {
        (!self.MESSAGE_PATTERN.is_empty()).then_some(self.MESSAGE_PATTERN.as_str())
    }

    pub fn default_category(&self) -> Option<&str> {
        let category = self.DEFAULT_CATEGORY.trim();
        (!category.is_empty()).then_some(category)
    }
}

#[test]
fn test_empty_values_are_unset() {
    let config = CatLogConfig {
        MESSAGE_PATTERN: "%l %m".into(),
        DEFAULT_CATEGORY: "  ".into(),
    };
    assert_eq!(config.message_pattern(), Some("%l %m"));
    assert_eq!(config.default_category(), None);

    let config = CatLogConfig {
        DEFAULT_CATEGORY: " app ".into(),
        ..Default::default()
    };
    assert_eq!(config.message_pattern(), None);
    assert_eq!(config.default_category(), Some("app"));
}
