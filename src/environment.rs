use strum::{Display, EnumString};

/// Deployment environment, selected by `APP_ENVIRONMENT`.
///
/// Picks which `config/{environment}.toml` file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}
