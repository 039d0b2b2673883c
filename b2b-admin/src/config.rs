use b2b_core::B2BApp;

/// Environment variables with this prefix override config keys:
/// `B2B__PAGINATE__MAX=50` sets `paginate.max`.
pub const ENV_PREFIX: &str = "B2B__";

const DEFAULTS: &[(&str, &str)] = &[
    ("http.host", "127.0.0.1"),
    ("http.port", "3030"),
    ("scope.policy", "strict"),
    ("permissions.enforce", "true"),
];

/// Fill every key not already set.
pub fn apply_defaults(app: &B2BApp) {
    for (key, value) in DEFAULTS {
        if app.get(key).is_none() {
            app.set(*key, *value);
        }
    }
}

/// Load environment overrides, then defaults for whatever is left.
pub fn load(app: &B2BApp) -> usize {
    let loaded = app.load_env(ENV_PREFIX);
    apply_defaults(app);
    loaded
}
