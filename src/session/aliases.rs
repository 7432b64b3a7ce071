use tracing::debug;

/// Every string the configured device root has resolved to, so `..` is not
/// offered once the user is back at the root under any of its names.
#[derive(Debug, Clone)]
pub struct RootAliasTracker {
    root: String,
    aliases: Vec<String>,
}

impl RootAliasTracker {
    /// Seeded with the configured root literal.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            aliases: vec![root.clone()],
            root,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_alias(&self, path: &str) -> bool {
        self.aliases.iter().any(|alias| alias == path)
    }

    /// Remember a resolution of the root literal. Never shrinks.
    pub fn record_root_resolution(&mut self, resolved: &str) {
        if !self.is_alias(resolved) {
            debug!("Added root alias: {}", resolved);
            self.aliases.push(resolved.to_string());
        }
    }

    /// True at `/`, and at (or above) a root alias unless browsing above the
    /// root is allowed.
    pub fn is_at_or_above_root(&self, resolved: &str, browse_above_root: bool) -> bool {
        if resolved == "/" {
            return true;
        }
        if browse_above_root {
            return false;
        }
        let prefix = format!("{}/", resolved.trim_end_matches('/'));
        self.aliases
            .iter()
            .any(|alias| alias == resolved || alias.starts_with(&prefix))
    }

    pub fn offers_parent(&self, resolved: &str, browse_above_root: bool) -> bool {
        !self.is_at_or_above_root(resolved, browse_above_root)
    }
}
