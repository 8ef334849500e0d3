//! System site rendering.
//!
//! System sites are not compiled; they are rendered from an external fixed
//! template. The template sees `server_name`, `cert_name`, `ssl_ciphers` and
//! `proxy_pass`, and any other variable is an error.

use minijinja::{context, Environment, UndefinedBehavior};

use crate::error::CompileError;
use crate::site::descriptor::SystemSite;

const TEMPLATE_NAME: &str = "system_site";

/// Renders system sites from one template source.
pub struct SystemSiteRenderer<'source> {
    env: Environment<'source>,
}

impl<'source> SystemSiteRenderer<'source> {
    pub fn new(template: &'source str) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template(TEMPLATE_NAME, template)?;
        Ok(Self { env })
    }

    pub fn render(&self, site: &SystemSite, ssl_ciphers: &str) -> Result<String, CompileError> {
        let wrap = |source| CompileError::Template {
            site: site.name.clone(),
            source,
        };
        let template = self.env.get_template(TEMPLATE_NAME).map_err(wrap)?;
        template
            .render(context! {
                server_name => &site.name,
                cert_name => &site.name,
                ssl_ciphers => ssl_ciphers,
                proxy_pass => site.proxy_pass(),
            })
            .map_err(wrap)
    }
}
