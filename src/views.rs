//! HTML pages for the start, protected and rejected views
//!
//! Built-in templates are compiled in. A file named `{view}.hbs` in the
//! configured views folder replaces the built-in template of the same name.

use crate::error::ConfigError;
use crate::models::SessionIdentity;
use crate::routes;
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;

const APP_TITLE: &str = "followgate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Index,
    Success,
    NotFollow,
}

impl View {
    pub const ALL: [Self; 3] = [Self::Index, Self::Success, Self::NotFollow];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Success => "success",
            Self::NotFollow => "not_follow",
        }
    }

    const fn builtin(self) -> &'static str {
        match self {
            Self::Index => include_str!("../templates/index.hbs"),
            Self::Success => include_str!("../templates/success.hbs"),
            Self::NotFollow => include_str!("../templates/not_follow.hbs"),
        }
    }
}

pub struct ViewRenderer {
    handlebars: Handlebars<'static>,
    organization: String,
}

impl ViewRenderer {
    /// Register the built-in templates, replaced by any override found in `folder`
    ///
    /// A missing folder is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be read or does not compile
    pub fn new(folder: &Path, organization: &str) -> Result<Self, ConfigError> {
        Self::build(Some(folder), organization)
    }

    /// Renderer using only the built-in templates
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template does not compile
    pub fn builtin(organization: &str) -> Result<Self, ConfigError> {
        Self::build(None, organization)
    }

    fn build(folder: Option<&Path>, organization: &str) -> Result<Self, ConfigError> {
        let mut handlebars = Handlebars::new();

        for view in View::ALL {
            let override_path = folder
                .map(|f| f.join(format!("{}.hbs", view.name())))
                .filter(|p| p.is_file());
            let source = if let Some(override_path) = override_path {
                log::info!("Using view override {}", override_path.display());
                std::fs::read_to_string(&override_path).map_err(|e| {
                    ConfigError::Views(format!("{}: {e}", override_path.display()))
                })?
            } else {
                view.builtin().to_string()
            };

            handlebars
                .register_template_string(view.name(), source)
                .map_err(|e| ConfigError::Views(format!("{}: {e}", view.name())))?;
        }

        Ok(Self {
            handlebars,
            organization: organization.to_string(),
        })
    }

    /// Public start page
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render
    pub fn render_index(&self) -> Result<String, handlebars::RenderError> {
        self.handlebars.render(
            View::Index.name(),
            &json!({
                "title": APP_TITLE,
                "organization": self.organization,
                "login_path": routes::LOGIN,
            }),
        )
    }

    /// Protected page for the signed-in identity
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render
    pub fn render_success(
        &self,
        identity: &SessionIdentity,
    ) -> Result<String, handlebars::RenderError> {
        self.handlebars.render(
            View::Success.name(),
            &json!({
                "title": APP_TITLE,
                "organization": self.organization,
                "display_name": identity.display_name,
                "login": identity.login,
                "logout_path": routes::LOGOUT,
            }),
        )
    }

    /// Public rejection page
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render
    pub fn render_not_follow(&self) -> Result<String, handlebars::RenderError> {
        self.handlebars.render(
            View::NotFollow.name(),
            &json!({
                "title": APP_TITLE,
                "organization": self.organization,
                "start_path": routes::START_PAGE,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixtures;

    #[test]
    fn test_builtin_views_render() {
        let renderer = ViewRenderer::builtin("acme").unwrap();

        let index = renderer.render_index().unwrap();
        assert!(index.contains("href=\"/auth/provider\""));
        assert!(index.contains("acme"));

        let not_follow = renderer.render_not_follow().unwrap();
        assert!(not_follow.contains("Access denied"));
    }

    #[test]
    fn test_success_view_escapes_profile_values() {
        let renderer = ViewRenderer::builtin("acme").unwrap();
        let mut identity = crate::models::SessionIdentity::from(&TestFixtures::identity());
        identity.display_name = "<script>alert(1)</script>".to_string();

        let html = renderer.render_success(&identity).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("href=\"/logout\""));
    }

    #[test]
    fn test_folder_override_replaces_single_view() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("not_follow.hbs"), "Go follow {{organization}}!").unwrap();

        let renderer = ViewRenderer::new(dir.path(), "acme").unwrap();
        assert_eq!(renderer.render_not_follow().unwrap(), "Go follow acme!");
        assert!(renderer.render_index().unwrap().contains("Sign in"));
    }

    #[test]
    fn test_broken_override_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.hbs"), "{{#if}}").unwrap();

        assert!(matches!(
            ViewRenderer::new(dir.path(), "acme"),
            Err(ConfigError::Views(_))
        ));
    }
}
