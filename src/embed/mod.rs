//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Live reload client served by the proxy
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{RELOAD_JS, ReloadVars};
//!
//! let js = RELOAD_JS.render(&ReloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Path the proxy serves the reload client under.
    pub const RELOAD_JS_PATH: &str = "/__assetline/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__ASSETLINE_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live reload client with WebSocket port injection.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// Tag injected into proxied HTML pages.
    pub fn script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_PATH}" defer></script>"#)
    }
}
