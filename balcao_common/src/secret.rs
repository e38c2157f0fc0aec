use std::fmt::{self, Debug, Display};

/// A credential pulled from the environment — the gateway access token or the messenger API
/// key. `Debug` and `Display` render a fixed mask; the value only leaves through an explicit
/// [`reveal`](Secret::reveal) call at the point an auth header is built.
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// The unmasked value.
    pub fn reveal(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn the_value_never_leaks_through_formatting() {
        let token = Secret::new("APP_USR-123456");
        assert_eq!(format!("{token}"), "****");
        assert_eq!(format!("{token:?}"), "****");
        assert_eq!(token.reveal(), "APP_USR-123456");
    }

    #[test]
    fn a_missing_credential_is_detectable() {
        assert!(Secret::default().is_empty());
        assert!(!Secret::new("k").is_empty());
    }
}
