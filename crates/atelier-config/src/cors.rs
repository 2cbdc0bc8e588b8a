use serde::Deserialize;

/// Cross-origin settings for the browser dashboard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins ("*" or a list)
    #[serde(default)]
    pub origins: AnyOrList,
    /// Allowed methods ("*" or a list)
    #[serde(default)]
    pub methods: AnyOrList,
    /// Allowed request headers ("*" or a list)
    #[serde(default)]
    pub headers: AnyOrList,
    /// Allow cookies and authorization headers
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime (e.g. "1h")
    #[serde(default)]
    pub max_age: Option<String>,
}

/// Wildcard or an explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "StringOrList")]
pub enum AnyOrList {
    #[default]
    Any,
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl From<StringOrList> for AnyOrList {
    fn from(value: StringOrList) -> Self {
        let values = match value {
            StringOrList::One(single) => vec![single],
            StringOrList::Many(many) => many,
        };

        if values.iter().any(|v| v == "*") {
            Self::Any
        } else {
            Self::List(values)
        }
    }
}
