use std::collections::HashMap;

use crate::filters::FilterKind;

/// Registry for looking up catalog filters by name
///
/// Built-in entries are registered under their canonical names. Hue rotation
/// is parameterised and is looked up as `hue-rotate:<degrees>`.
pub struct FilterRegistry {
    filters: HashMap<String, FilterKind>,
}

impl FilterRegistry {
    /// Create a new registry with all built-in filters
    pub fn new() -> Self {
        let mut registry = Self {
            filters: HashMap::new(),
        };

        registry.register_builtin_filters();
        registry
    }

    fn register_builtin_filters(&mut self) {
        let builtins = [
            FilterKind::Identity,
            FilterKind::Sepia,
            FilterKind::Grayscale,
            FilterKind::Blur,
            FilterKind::HueRotate { degrees: 90.0 },
            FilterKind::Invert,
            FilterKind::Vintage,
            FilterKind::Cool,
            FilterKind::Warm,
        ];

        for filter in builtins {
            self.filters.insert(filter.name().to_string(), filter);
        }
        self.filters.insert("none".to_string(), FilterKind::Identity);
    }

    /// Register an alias for a catalog filter
    pub fn register<S: Into<String>>(&mut self, name: S, filter: FilterKind) {
        self.filters.insert(name.into().to_lowercase(), filter);
    }

    /// Get a filter by name
    ///
    /// Returns None if the name is unknown or a hue-rotate argument is not a
    /// finite number.
    pub fn get_filter(&self, name: &str) -> Option<FilterKind> {
        let name = name.trim().to_lowercase();

        if let Some(arg) = name.strip_prefix("hue-rotate:") {
            let degrees: f32 = arg.trim().trim_end_matches("deg").parse().ok()?;
            return degrees.is_finite().then_some(FilterKind::HueRotate { degrees });
        }

        self.filters.get(&name).copied()
    }

    /// Get all available filter names, sorted
    pub fn available_filters(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a filter is available
    pub fn has_filter(&self, name: &str) -> bool {
        self.get_filter(name).is_some()
    }

    /// Get the number of registered names
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_filters_available() {
        let registry = FilterRegistry::new();

        for name in ["identity", "sepia", "grayscale", "blur", "invert", "vintage", "cool", "warm"] {
            assert!(registry.has_filter(name), "missing {}", name);
        }
        assert_eq!(registry.len(), 10); // 9 catalog entries + "none"
    }

    #[test]
    fn test_get_filter() {
        let registry = FilterRegistry::new();

        assert_eq!(registry.get_filter("Vintage"), Some(FilterKind::Vintage));
        assert_eq!(registry.get_filter("none"), Some(FilterKind::Identity));
        assert!(registry.get_filter("unknown").is_none());
    }

    #[test]
    fn test_hue_rotate_argument() {
        let registry = FilterRegistry::new();

        assert_eq!(
            registry.get_filter("hue-rotate:45"),
            Some(FilterKind::HueRotate { degrees: 45.0 })
        );
        assert_eq!(
            registry.get_filter("hue-rotate:-30deg"),
            Some(FilterKind::HueRotate { degrees: -30.0 })
        );
        assert!(registry.get_filter("hue-rotate:abc").is_none());
        assert!(registry.get_filter("hue-rotate:inf").is_none());
    }

    #[test]
    fn test_custom_alias_registration() {
        let mut registry = FilterRegistry::new();

        registry.register("Noir", FilterKind::Grayscale);

        assert!(registry.has_filter("noir"));
        assert_eq!(registry.len(), 11);
    }
}
