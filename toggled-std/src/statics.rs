//! # Static Feature Registration
//!
//! Features can be submitted from anywhere in the program with
//! [`submit_feature!`](crate::submit_feature) (or the `#[toggled::register]`
//! attribute) and are collected through `inventory` when a
//! [`Toggles`](crate::Toggles) is built with static features.
//!
//! # Example
//!
//! ```rust,ignore
//! fn greeter() -> Greeter {
//!     Greeter::default()
//! }
//!
//! toggled::submit_feature!("greeter", greeter);
//!
//! let toggles = Toggles::with_static_features();
//! assert!(toggles.registry().contains("greeter"));
//! ```

use crate::registry::Registry;

/// A feature submitted for static registration.
pub struct FeatureRegistration {
    /// The name the feature is registered under.
    pub name: &'static str,
    /// Registers a fresh instance of the feature.
    pub register: fn(&Registry),
}

impl FeatureRegistration {
    /// Create a registration entry.
    pub const fn new(name: &'static str, register: fn(&Registry)) -> Self {
        Self { name, register }
    }
}

inventory::collect!(FeatureRegistration);

/// Iterate every submitted registration, in no particular order.
pub fn registrations() -> impl Iterator<Item = &'static FeatureRegistration> {
    inventory::iter::<FeatureRegistration>.into_iter()
}

/// Register every submitted feature.
///
/// Registrations are applied in name order so that duplicate names resolve
/// the same way on every run.
pub fn register_all(registry: &Registry) {
    let mut entries: Vec<_> = registrations().collect();
    entries.sort_by_key(|entry| entry.name);
    for entry in entries {
        tracing::debug!(feature = entry.name, "registering static feature");
        (entry.register)(registry);
    }
}

/// Submit a feature for static registration.
///
/// `$constructor` is any path to a `fn() -> F` where `F: Feature`. It runs
/// each time static features are registered and may itself use the
/// [`global`](crate::global) functions.
///
/// ```rust,ignore
/// toggled::submit_feature!("greeter", Greeter::default);
/// ```
#[macro_export]
macro_rules! submit_feature {
    ($name:expr, $constructor:path $(,)?) => {
        $crate::inventory::submit! {
            $crate::statics::FeatureRegistration::new($name, |registry| {
                registry.register($name, $constructor())
            })
        }
    };
}
