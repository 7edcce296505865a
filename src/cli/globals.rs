use secrecy::SecretString;

/// Process-wide configuration, loaded once at startup and passed by
/// injection, never held as ambient global state.
#[derive(Clone)]
pub struct GlobalArgs {
    pub signing_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("signing_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("hunter2"));
        assert_eq!(args.signing_secret.expose_secret(), "hunter2");
    }

    #[test]
    fn debug_redacts_secret() {
        let args = GlobalArgs::new(SecretString::from("hunter2"));
        assert!(!format!("{args:?}").contains("hunter2"));
    }
}
