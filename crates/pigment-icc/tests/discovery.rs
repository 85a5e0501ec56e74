//! Profile discovery and configuration against a real directory tree.

use std::fs;
use std::path::PathBuf;

use pigment_icc::{IccConfig, Intent, Profile, ProfileSignature, ProfileStore};
use tempfile::TempDir;

fn write_profiles(dir: &TempDir) {
    let srgb = Profile::srgb();
    let gray = Profile::gray(1.8).unwrap();
    fs::write(dir.path().join("srgb.icc"), srgb.icc_data()).unwrap();

    let nested = dir.path().join("vendor").join("gray");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("Gray18.ICM"), gray.icc_data()).unwrap();

    // same content under another name is the same product
    fs::write(dir.path().join("copy-of-srgb.icc"), srgb.icc_data()).unwrap();

    fs::write(dir.path().join("broken.icc"), b"definitely not a profile").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
}

#[test]
fn discovers_nested_profiles() {
    let dir = TempDir::new().unwrap();
    write_profiles(&dir);

    let store = ProfileStore::discover(&[dir.path()]);
    assert_eq!(store.len(), 2);

    let rgb = store.profiles_for_signature(ProfileSignature::Rgb);
    assert_eq!(rgb.len(), 1);
    assert!(rgb[0].path().is_some());
    assert!(rgb[0].is_valid());

    let gray = store.profiles_for_signature(ProfileSignature::Gray);
    assert_eq!(gray.len(), 1);
    assert!(store.get_by_name(gray[0].name()).is_some());
    assert!(store.profiles_for_signature(ProfileSignature::Cmyk).is_empty());
}

#[test]
fn scan_counts_only_new_profiles() {
    let dir = TempDir::new().unwrap();
    write_profiles(&dir);

    let mut store = ProfileStore::new();
    store.insert(Profile::srgb());
    assert_eq!(store.scan(dir.path()), 1);
    assert_eq!(store.scan(dir.path()), 0);
}

#[test]
fn config_file_resolves_relative_paths() {
    let dir = TempDir::new().unwrap();
    let cfg_path = dir.path().join("pigment.yaml");
    fs::write(
        &cfg_path,
        "search_paths:\n  - profiles\n  - /abs/icc\nintent: saturation\ndefault_cmyk_profile: Coated\n",
    )
    .unwrap();

    let cfg = IccConfig::from_file(&cfg_path).unwrap();
    assert_eq!(
        cfg.search_paths,
        vec![dir.path().join("profiles"), PathBuf::from("/abs/icc")]
    );
    assert_eq!(cfg.intent, Intent::Saturation);
    assert_eq!(cfg.default_cmyk_profile.as_deref(), Some("Coated"));
    assert!(!cfg.black_point_compensation);
}

#[test]
fn config_file_missing() {
    let dir = TempDir::new().unwrap();
    assert!(IccConfig::from_file(dir.path().join("absent.yaml")).is_err());
}

#[test]
fn env_paths_searched_first() {
    let dir = TempDir::new().unwrap();
    let extra = dir.path().to_string_lossy().into_owned();
    let cfg = IccConfig::from_yaml_str("search_paths: [/usr/share/color/icc]\n")
        .unwrap()
        .with_vars(|k| (k == "PIGMENT_PROFILE_PATH").then(|| extra.clone()));
    assert_eq!(cfg.search_paths[0], dir.path());
    assert_eq!(cfg.search_paths.len(), 2);
}
