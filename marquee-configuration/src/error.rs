use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_saphyr::Error),
    #[error("invalid path pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
    #[error("invalid scope `{0}`: expected an absolute URL")]
    InvalidScope(String),
    #[error("`{0}` needs at least one matcher")]
    EmptyMatcherList(&'static str),
    #[error("rule `{rule}`: {reason}")]
    InvalidBound { rule: String, reason: &'static str },
    #[error("duplicate rule name `{0}`")]
    DuplicateRule(String),
}
