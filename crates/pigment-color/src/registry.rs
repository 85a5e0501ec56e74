//! Color space registry.
//!
//! The registry discovers profiles once, picks a default profile per model
//! family and builds the built-in models around one shared sRGB reference.
//!
//! # Example
//!
//! ```rust
//! use pigment_color::ColorSpaceRegistry;
//! use pigment_icc::IccConfig;
//!
//! let registry = ColorSpaceRegistry::new(IccConfig::empty()).unwrap();
//! let rgba = registry.lookup("RGBA").unwrap();
//! assert_eq!(rgba.pixel_size(), 4);
//! assert!(registry.lookup("XYZ").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use pigment_icc::{IccConfig, Profile, ProfileSignature, ProfileStore};
use tracing::{debug, warn};

use crate::models::{self, ModelContext};
use crate::{ColorError, ColorResult, ColorSpace};

/// Looks color spaces up by identifier.
pub struct ColorSpaceRegistry {
    config: IccConfig,
    store: ProfileStore,
    reference: Arc<Profile>,
    spaces: HashMap<String, Arc<dyn ColorSpace>>,
    order: Vec<String>,
}

impl ColorSpaceRegistry {
    /// Discovers profiles on the configured search paths and builds the
    /// built-in models.
    pub fn new(config: IccConfig) -> ColorResult<Self> {
        let store = ProfileStore::discover(&config.search_paths);
        Self::with_store(config, store)
    }

    /// Builds the registry around an existing profile store.
    ///
    /// The built-in sRGB and gamma-2.2 gray profiles are added to the store.
    pub fn with_store(config: IccConfig, mut store: ProfileStore) -> ColorResult<Self> {
        let reference = store.insert(Profile::srgb());
        let builtin_gray = match Profile::gray(2.2) {
            Ok(p) => Some(store.insert(p)),
            Err(e) => {
                warn!(error = %e, "built-in gray profile unavailable");
                None
            }
        };

        let ctx = ModelContext {
            rgb: pick(&store, config.default_rgb_profile.as_deref(), ProfileSignature::Rgb)
                .or_else(|| Some(Arc::clone(&reference))),
            gray: pick(&store, config.default_gray_profile.as_deref(), ProfileSignature::Gray).or(builtin_gray),
            cmyk: pick(&store, config.default_cmyk_profile.as_deref(), ProfileSignature::Cmyk)
                .or_else(|| first_valid(&store, ProfileSignature::Cmyk)),
            reference: Arc::clone(&reference),
            intent: config.intent,
            black_point_compensation: config.black_point_compensation,
        };
        debug!(
            rgb = ctx.rgb.as_ref().map(|p| p.name()),
            gray = ctx.gray.as_ref().map(|p| p.name()),
            cmyk = ctx.cmyk.as_ref().map(|p| p.name()),
            profiles = store.len(),
            "default profiles"
        );

        let mut registry = Self {
            config,
            store,
            reference,
            spaces: HashMap::new(),
            order: Vec::new(),
        };
        for space in models::builtin_models(&ctx)? {
            registry.register(space);
        }
        Ok(registry)
    }

    /// Adds a space, replacing and returning any space with the same id.
    pub fn register(&mut self, space: Arc<dyn ColorSpace>) -> Option<Arc<dyn ColorSpace>> {
        let id = space.id().to_string();
        let previous = self.spaces.insert(id.clone(), space);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Space registered under `id`.
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn ColorSpace>> {
        self.spaces.get(id).cloned()
    }

    /// Like [`lookup`](Self::lookup) but an unknown id is an error.
    pub fn get(&self, id: &str) -> ColorResult<Arc<dyn ColorSpace>> {
        self.lookup(id).ok_or_else(|| ColorError::UnknownColorSpace(id.to_string()))
    }

    /// Registered identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Profiles applicable to the space `id`.
    pub fn profiles_for(&self, id: &str) -> ColorResult<Vec<Arc<Profile>>> {
        let space = self.get(id)?;
        if space.profile_format().is_none() {
            return Ok(Vec::new());
        }
        Ok(self.store.profiles_for_signature(space.signature()))
    }

    /// Profile by product name.
    pub fn profile_by_name(&self, name: &str) -> Option<Arc<Profile>> {
        self.store.get_by_name(name)
    }

    /// The sRGB profile every built-in model refers normalized colors to.
    pub fn reference_profile(&self) -> &Arc<Profile> {
        &self.reference
    }

    /// Discovered and built-in profiles.
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Configuration the registry was built from.
    pub fn config(&self) -> &IccConfig {
        &self.config
    }
}

impl std::fmt::Debug for ColorSpaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorSpaceRegistry")
            .field("spaces", &self.order)
            .field("profiles", &self.store.len())
            .finish_non_exhaustive()
    }
}

fn pick(store: &ProfileStore, name: Option<&str>, signature: ProfileSignature) -> Option<Arc<Profile>> {
    let name = name?;
    match store.get_by_name(name) {
        Some(p) if p.signature() == signature && p.is_valid() => Some(p),
        Some(p) => {
            warn!(profile = name, signature = %p.signature(), expected = %signature, "configured profile unusable");
            None
        }
        None => {
            warn!(profile = name, "configured profile not found");
            None
        }
    }
}

fn first_valid(store: &ProfileStore, signature: ProfileSignature) -> Option<Arc<Profile>> {
    store
        .profiles_for_signature(signature)
        .into_iter()
        .find(|p| p.is_valid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ColorSpaceRegistry {
        ColorSpaceRegistry::new(IccConfig::empty()).unwrap()
    }

    #[test]
    fn test_builtin_ids() {
        let reg = registry();
        let ids: Vec<&str> = reg.ids().collect();
        assert_eq!(
            ids,
            [
                "RGBA", "RGBA16", "RGBAF16", "RGBAF32", "GRAY", "GRAYA", "GRAYA16", "CMYKA", "CMYKA16", "ALPHA",
                "WET"
            ]
        );
        assert!(matches!(reg.get("LAB"), Err(ColorError::UnknownColorSpace(_))));
    }

    #[test]
    fn test_rgb_default_is_reference() {
        let reg = registry();
        let rgba = reg.get("RGBA").unwrap();
        assert!(Arc::ptr_eq(rgba.default_profile().unwrap(), reg.reference_profile()));
        assert!(rgba.is_valid());
        assert!(!reg.get("CMYKA").unwrap().is_valid());
    }

    #[test]
    fn test_profiles_for() {
        let reg = registry();
        assert_eq!(reg.profiles_for("RGBA16").unwrap().len(), 1);
        assert_eq!(reg.profiles_for("GRAYA").unwrap().len(), 1);
        assert!(reg.profiles_for("CMYKA").unwrap().is_empty());
        assert!(reg.profiles_for("ALPHA").unwrap().is_empty());
        assert!(reg.profiles_for("nope").is_err());
    }

    #[test]
    fn test_configured_name_with_wrong_signature() {
        let mut config = IccConfig::empty();
        let srgb_name = Profile::srgb().name().to_string();
        config.default_gray_profile = Some(srgb_name);
        let reg = ColorSpaceRegistry::new(config).unwrap();
        let gray = reg.get("GRAYA").unwrap();
        assert_eq!(gray.default_profile().unwrap().signature(), ProfileSignature::Gray);
    }

    #[test]
    fn test_register_replaces() {
        let mut reg = registry();
        let ctx = ModelContext::standalone();
        let replacement: Arc<dyn ColorSpace> = Arc::new(models::rgba8(&ctx).unwrap());
        assert!(reg.register(Arc::clone(&replacement)).is_some());
        assert_eq!(reg.ids().count(), 9);
        assert!(Arc::ptr_eq(&reg.lookup("RGBA").unwrap(), &replacement));
    }
}
