/// Built-in ASCII-armored OpenPGP key that signs the default host's checksum
/// manifests, embedded at build time from `BINSTAGE_RELEASES_PUBLIC_KEY`.
///
/// Override per call with [`crate::ReleasesConfig::armored_public_key`]. With
/// neither present, verified installs fail before any download.
pub const DEFAULT_PUBLIC_KEY: Option<&str> = option_env!("BINSTAGE_RELEASES_PUBLIC_KEY");
