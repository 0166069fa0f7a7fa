//! # Component Trait
//!
//! Components are pure data containers with no behavior. Each component
//! type gets one dense store and one signature bit, assigned when the type
//! is registered with a [`Coordinator`](super::Coordinator).

use std::any::type_name;

/// Marker trait for ECS components.
///
/// Components must be `Send + Sync + 'static` so a coordinator can sit
/// behind a shared lock. Identity is the Rust type itself; there is no
/// string or runtime name lookup.
///
/// # Example
///
/// ```rust
/// use kestrel_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default)]
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: Send + Sync + 'static {
    /// Human-readable name, used in error messages and logs.
    #[must_use]
    fn name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name(type_name::<Self>())
    }
}

/// Strips the module path from a type name (`a::b::Transform` -> `Transform`).
///
/// Generic arguments are kept as-is.
#[must_use]
pub fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl Component for Marker {}

    #[test]
    fn test_component_name() {
        assert_eq!(Marker::name(), "Marker");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Transform"), "Transform");
        assert_eq!(short_type_name("Transform"), "Transform");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }
}
