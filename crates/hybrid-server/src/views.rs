// Views known to the server and whether their instances are stateful

use std::collections::HashMap;

use hybrid_router::{Config, MountConfig, ViewClass};

#[derive(Debug, Clone, Default)]
pub struct ViewCatalog {
    stateful: HashMap<ViewClass, bool>,
}

impl ViewCatalog {
    pub fn from_config(config: &Config) -> Self {
        let stateful = config
            .mounts
            .iter()
            .map(|mount| (ViewClass::new(mount.view.as_str()), mount.stateful))
            .collect();
        Self { stateful }
    }

    /// Unknown views are treated as stateless
    pub fn is_stateful(&self, view_class: &ViewClass) -> bool {
        self.stateful.get(view_class).copied().unwrap_or(false)
    }
}

/// Mounts served when `hybrid.toml` declares none
pub fn demo_mounts() -> Vec<MountConfig> {
    vec![
        MountConfig {
            path: "/counter".to_string(),
            view: "counter".to_string(),
            stateful: true,
            redirect_on_bookmarkable: None,
        },
        MountConfig {
            path: "/about".to_string(),
            view: "about".to_string(),
            stateful: false,
            redirect_on_bookmarkable: None,
        },
    ]
}
