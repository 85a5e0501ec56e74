//! ICC profile wrapper.

use crate::{IccError, IccResult, ProfileFormat};
use lcms2::{ColorSpaceSignature, Profile as LcmsProfile};
use std::fmt;
use std::path::{Path, PathBuf};

/// Color model a profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSignature {
    /// RGB device or working space.
    Rgb,
    /// Single-channel gray.
    Gray,
    /// Four-ink CMYK.
    Cmyk,
    /// CIE L*a*b*.
    Lab,
    /// Anything else.
    Other,
}

impl ProfileSignature {
    fn from_lcms(sig: ColorSpaceSignature) -> Self {
        match sig {
            ColorSpaceSignature::RgbData => Self::Rgb,
            ColorSpaceSignature::GrayData => Self::Gray,
            ColorSpaceSignature::CmykData => Self::Cmyk,
            ColorSpaceSignature::LabData => Self::Lab,
            _ => Self::Other,
        }
    }

    /// Float transform format for this signature, if pigment can transform it.
    pub const fn format(self) -> Option<ProfileFormat> {
        match self {
            Self::Rgb => Some(ProfileFormat::Rgb),
            Self::Gray => Some(ProfileFormat::Gray),
            Self::Cmyk => Some(ProfileFormat::Cmyk),
            Self::Lab | Self::Other => None,
        }
    }
}

impl fmt::Display for ProfileSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rgb => "RGB",
            Self::Gray => "GRAY",
            Self::Cmyk => "CMYK",
            Self::Lab => "Lab",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// An ICC color profile.
///
/// Holds the product name, signature and the serialized ICC data. Profiles
/// are loaded once and shared as `Arc<Profile>`; caches compare them by
/// `Arc` identity, never by content.
///
/// # Example
///
/// ```rust
/// use pigment_icc::{Profile, ProfileSignature};
///
/// let srgb = Profile::srgb();
/// assert_eq!(srgb.signature(), ProfileSignature::Rgb);
/// assert!(srgb.is_valid());
/// ```
#[derive(Clone)]
pub struct Profile {
    name: String,
    signature: ProfileSignature,
    valid: bool,
    path: Option<PathBuf>,
    icc: Vec<u8>,
}

impl Profile {
    /// Loads a profile from an ICC file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or contains invalid data.
    pub fn from_file(path: &Path) -> IccResult<Self> {
        let data = std::fs::read(path)?;
        let mut profile = Self::from_icc(&data)
            .map_err(|e| IccError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        profile.path = Some(path.to_path_buf());
        if profile.name.is_empty() {
            profile.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(profile)
    }

    /// Creates a profile from raw ICC data.
    pub fn from_icc(data: &[u8]) -> IccResult<Self> {
        let inner = LcmsProfile::new_icc(data).map_err(|e| IccError::InvalidProfile(e.to_string()))?;
        Ok(Self::from_lcms(&inner, data.to_vec()))
    }

    /// Creates the built-in sRGB profile.
    pub fn srgb() -> Self {
        let inner = LcmsProfile::new_srgb();
        let icc = inner.icc().unwrap_or_default();
        Self::from_lcms(&inner, icc)
    }

    /// Creates a D50 grayscale profile with the given gamma.
    pub fn gray(gamma: f64) -> IccResult<Self> {
        let curve = lcms2::ToneCurve::new(gamma);
        let inner = LcmsProfile::new_gray(&lcms2::CIExyY::d50(), &curve)
            .map_err(|e| IccError::CreateFailed(e.to_string()))?;
        let icc = inner.icc().map_err(|e| IccError::CreateFailed(e.to_string()))?;
        let mut profile = Self::from_lcms(&inner, icc);
        if profile.name.is_empty() {
            profile.name = format!("Gray gamma {gamma}");
        }
        Ok(profile)
    }

    /// Creates a profile that carries a name and signature but no ICC data.
    ///
    /// It is never valid; transforms involving it are never built.
    pub fn placeholder(name: impl Into<String>, signature: ProfileSignature) -> Self {
        Self {
            name: name.into(),
            signature,
            valid: false,
            path: None,
            icc: Vec::new(),
        }
    }

    fn from_lcms(inner: &LcmsProfile, icc: Vec<u8>) -> Self {
        let name = inner
            .info(lcms2::InfoType::Description, lcms2::Locale::none())
            .unwrap_or_default()
            .trim()
            .to_string();
        let signature = ProfileSignature::from_lcms(inner.color_space());
        let valid = signature.format().is_some() && !icc.is_empty();
        Self {
            name,
            signature,
            valid,
            path: None,
            icc,
        }
    }

    /// Replaces the product name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Product name (ICC description tag).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color model signature.
    #[inline]
    pub fn signature(&self) -> ProfileSignature {
        self.signature
    }

    /// `true` if the profile can take part in transforms.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// File the profile was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialized ICC data.
    pub fn icc_data(&self) -> &[u8] {
        &self.icc
    }

    /// Opens an engine handle for building a transform.
    pub(crate) fn open(&self) -> IccResult<LcmsProfile> {
        if !self.valid {
            return Err(IccError::InvalidProfile(format!("'{}' is not usable", self.name)));
        }
        LcmsProfile::new_icc(&self.icc).map_err(|e| IccError::InvalidProfile(e.to_string()))
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("valid", &self.valid)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb() {
        let profile = Profile::srgb();
        assert_eq!(profile.signature(), ProfileSignature::Rgb);
        assert!(profile.is_valid());
        assert!(!profile.name().is_empty());
        assert!(!profile.icc_data().is_empty());
    }

    #[test]
    fn test_gray() {
        let profile = Profile::gray(2.2).unwrap();
        assert_eq!(profile.signature(), ProfileSignature::Gray);
        assert!(profile.is_valid());
        assert!(!profile.name().is_empty());
    }

    #[test]
    fn test_icc_round_trip() {
        let data = Profile::srgb().icc_data().to_vec();
        let reloaded = Profile::from_icc(&data).unwrap();
        assert_eq!(reloaded.signature(), ProfileSignature::Rgb);
        assert!(reloaded.open().is_ok());
    }

    #[test]
    fn test_placeholder_invalid() {
        let p = Profile::placeholder("Missing CMYK", ProfileSignature::Cmyk);
        assert!(!p.is_valid());
        assert!(p.open().is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(Profile::from_icc(b"not a profile").is_err());
    }
}
