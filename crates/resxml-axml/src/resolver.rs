//! Resource identifier resolution for namespaced attribute names.
//!
//! Attribute names in a resource namespace carry a numeric resource id in the
//! output. The lookup itself is external; this module defines the interface
//! and the namespace-to-package rule that decides which names are looked up.

use rustc_hash::FxHashMap;

/// Namespace of the platform framework attributes.
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

/// Namespace that refers to the application's own package.
pub const RES_AUTO_NAMESPACE: &str = "http://schemas.android.com/apk/res-auto";

/// Prefix of per-package resource namespaces.
pub const RES_NAMESPACE_PREFIX: &str = "http://schemas.android.com/apk/res/";

/// Package name of the platform framework.
pub const ANDROID_PACKAGE: &str = "android";

/// Maps `(attribute name, package)` to a numeric resource id.
pub trait ResourceResolver {
    /// Resource id of attribute `name` in `package`, if it exists.
    fn attribute_id(&self, name: &str, package: &str) -> Option<u32>;

    /// Package the `res-auto` namespace stands for.
    fn app_package(&self) -> Option<&str> {
        None
    }
}

/// Package a namespace URI refers to, if it is a resource namespace.
pub fn package_for_namespace<'a>(
    namespace: &'a str,
    resolver: &'a dyn ResourceResolver,
) -> Option<&'a str> {
    if namespace == RES_AUTO_NAMESPACE {
        resolver.app_package()
    } else {
        namespace
            .strip_prefix(RES_NAMESPACE_PREFIX)
            .filter(|package| !package.is_empty())
    }
}

/// Resolver that never finds an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ResourceResolver for NoResolver {
    fn attribute_id(&self, _name: &str, _package: &str) -> Option<u32> {
        None
    }
}

/// Resolver backed by an explicit table.
///
/// # Example
///
/// ```
/// use resxml_axml::{ResourceResolver, StaticResolver};
///
/// let resolver = StaticResolver::new()
///     .with_app_package("com.example")
///     .attr("com.example", "cornerRadius", 0x7f04_0001);
///
/// assert_eq!(resolver.attribute_id("cornerRadius", "com.example"), Some(0x7f04_0001));
/// assert_eq!(resolver.app_package(), Some("com.example"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    ids: FxHashMap<String, FxHashMap<String, u32>>,
    app_package: Option<String>,
}

impl StaticResolver {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package the `res-auto` namespace resolves to.
    pub fn with_app_package(mut self, package: impl Into<String>) -> Self {
        self.app_package = Some(package.into());
        self
    }

    /// Add an attribute id.
    pub fn attr(mut self, package: impl Into<String>, name: impl Into<String>, id: u32) -> Self {
        self.insert(package, name, id);
        self
    }

    /// Add an attribute id in place.
    pub fn insert(&mut self, package: impl Into<String>, name: impl Into<String>, id: u32) {
        self.ids
            .entry(package.into())
            .or_default()
            .insert(name.into(), id);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ids.values().map(FxHashMap::len).sum()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceResolver for StaticResolver {
    fn attribute_id(&self, name: &str, package: &str) -> Option<u32> {
        self.ids.get(package)?.get(name).copied()
    }

    fn app_package(&self) -> Option<&str> {
        self.app_package.as_deref()
    }
}

/// Public framework attribute ids (`android.R.attr`).
const FRAMEWORK_ATTRIBUTES: &[(&str, u32)] = &[
    ("theme", 0x0101_0000),
    ("label", 0x0101_0001),
    ("icon", 0x0101_0002),
    ("name", 0x0101_0003),
    ("permission", 0x0101_0006),
    ("readPermission", 0x0101_0007),
    ("writePermission", 0x0101_0008),
    ("protectionLevel", 0x0101_0009),
    ("sharedUserId", 0x0101_000b),
    ("hasCode", 0x0101_000c),
    ("persistent", 0x0101_000d),
    ("enabled", 0x0101_000e),
    ("debuggable", 0x0101_000f),
    ("exported", 0x0101_0010),
    ("process", 0x0101_0011),
    ("taskAffinity", 0x0101_0012),
    ("authorities", 0x0101_0018),
    ("priority", 0x0101_001c),
    ("launchMode", 0x0101_001d),
    ("screenOrientation", 0x0101_001e),
    ("configChanges", 0x0101_001f),
    ("description", 0x0101_0020),
    ("value", 0x0101_0024),
    ("resource", 0x0101_0025),
    ("mimeType", 0x0101_0026),
    ("scheme", 0x0101_0027),
    ("host", 0x0101_0028),
    ("port", 0x0101_0029),
    ("path", 0x0101_002a),
    ("pathPrefix", 0x0101_002b),
    ("pathPattern", 0x0101_002c),
    ("textSize", 0x0101_0095),
    ("textStyle", 0x0101_0097),
    ("textColor", 0x0101_0098),
    ("gravity", 0x0101_00af),
    ("layout_gravity", 0x0101_00b3),
    ("orientation", 0x0101_00c4),
    ("id", 0x0101_00d0),
    ("background", 0x0101_00d4),
    ("padding", 0x0101_00d5),
    ("paddingLeft", 0x0101_00d6),
    ("paddingTop", 0x0101_00d7),
    ("paddingRight", 0x0101_00d8),
    ("paddingBottom", 0x0101_00d9),
    ("visibility", 0x0101_00dc),
    ("layout_width", 0x0101_00f4),
    ("layout_height", 0x0101_00f5),
    ("layout_margin", 0x0101_00f6),
    ("layout_marginLeft", 0x0101_00f7),
    ("layout_marginTop", 0x0101_00f8),
    ("layout_marginRight", 0x0101_00f9),
    ("layout_marginBottom", 0x0101_00fa),
    ("src", 0x0101_0119),
    ("text", 0x0101_014f),
    ("hint", 0x0101_0150),
    ("layout_weight", 0x0101_0181),
    ("minSdkVersion", 0x0101_020c),
    ("versionCode", 0x0101_021b),
    ("versionName", 0x0101_021c),
    ("targetSdkVersion", 0x0101_0270),
    ("maxSdkVersion", 0x0101_0271),
    ("contentDescription", 0x0101_0273),
    ("allowBackup", 0x0101_0280),
    ("installLocation", 0x0101_02b7),
    ("alpha", 0x0101_031f),
    ("supportsRtl", 0x0101_03af),
    ("usesCleartextTraffic", 0x0101_04ec),
    ("roundIcon", 0x0101_052c),
    ("compileSdkVersion", 0x0101_0572),
    ("compileSdkVersionCodename", 0x0101_0573),
];

/// Resolver with the well-known framework attributes built in.
///
/// Names in the `android` package resolve from a built-in table; every other
/// package is delegated to an inner [`StaticResolver`].
#[derive(Debug, Clone)]
pub struct FrameworkResolver {
    framework: FxHashMap<&'static str, u32>,
    extra: StaticResolver,
}

impl FrameworkResolver {
    /// Create a resolver for an application package.
    pub fn new(app_package: impl Into<String>) -> Self {
        Self::with_table(StaticResolver::new().with_app_package(app_package))
    }

    /// Create a resolver that falls back to `extra` for non-framework packages.
    pub fn with_table(extra: StaticResolver) -> Self {
        Self {
            framework: FRAMEWORK_ATTRIBUTES.iter().copied().collect(),
            extra,
        }
    }
}

impl ResourceResolver for FrameworkResolver {
    fn attribute_id(&self, name: &str, package: &str) -> Option<u32> {
        if package == ANDROID_PACKAGE {
            if let Some(&id) = self.framework.get(name) {
                return Some(id);
            }
        }
        self.extra.attribute_id(name, package)
    }

    fn app_package(&self) -> Option<&str> {
        self.extra.app_package()
    }
}
