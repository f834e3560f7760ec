use crate::HostId;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pistore_digest::{DIGEST_LEN, Digest, Hasher};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Permanent Object ID: a 16-byte digest of a host ID followed by an
/// absolute path.
///
/// The same host backing up the same path always gets the same POID; the same
/// path on another host gets a different one. Chunks carry the POID of the
/// object they were cut from as raw bytes, while logs and JSON use hex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Poid(Digest);

impl Poid {
    /// Derive the POID for `path` on `host`.
    ///
    /// The path is hashed exactly as given (its OS-encoded bytes), so callers
    /// are expected to pass absolute paths; see [`resolve`](Self::resolve).
    ///
    /// ```
    /// use pistore_identity::{HostId, Poid};
    ///
    /// let host = HostId::new("4f1c0e").unwrap();
    /// assert_eq!(Poid::derive(&host, "/srv/data"), Poid::derive(&host, "/srv/data"));
    /// assert_ne!(Poid::derive(&host, "/srv/data"), Poid::derive(&host, "/srv/data2"));
    /// ```
    #[must_use]
    pub fn derive(host: &HostId, path: impl AsRef<Path>) -> Self {
        let mut hasher = Hasher::new();
        hasher
            .update(host.as_str().as_bytes())
            .update(path.as_ref().as_os_str().as_encoded_bytes());
        Self(hasher.finalize())
    }

    /// Derive the POID of `path` after [`absolute_path`] has cleaned it up, so
    /// every spelling of the same location gets the same POID.
    pub fn resolve(host: &HostId, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::derive(host, absolute_path(path)?))
    }

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(Digest::from_bytes(bytes))
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

/// Make `path` absolute against the current directory and clean it lexically:
/// `.` components are dropped, `..` removes the previous component and
/// trailing separators disappear.
///
/// The filesystem is never consulted, so symlinks are not resolved and the
/// path doesn't need to exist.
pub fn absolute_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    let mut clean = PathBuf::with_capacity(absolute.as_os_str().len());
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            // Popping at the root is a no-op, same as `/..` on disk.
            Component::ParentDir => {
                clean.pop();
            },
            other => clean.push(other),
        }
    }
    Ok(clean)
}

impl From<Digest> for Poid {
    fn from(digest: Digest) -> Self {
        Self(digest)
    }
}

impl From<Poid> for Digest {
    fn from(poid: Poid) -> Self {
        poid.0
    }
}

impl Display for Poid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Poid {
    type Err = pistore_digest::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Digest::from_hex(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::FakeProbe;
    use rstest::rstest;

    fn host(token: &str) -> HostId {
        HostId::new(token).unwrap()
    }

    #[test]
    fn derive_is_deterministic() {
        let h = host("host-a");
        assert_eq!(Poid::derive(&h, "/a/b"), Poid::derive(&h, "/a/b"));
    }

    #[test]
    fn derive_is_digest_of_concatenation() {
        let h = host("host-a");
        assert_eq!(Poid::derive(&h, "/a/b"), Poid::from(Digest::of("host-a/a/b")));
    }

    #[rstest]
    #[case("/a/b")]
    #[case("/")]
    #[case("/home/user/Documents/report.pdf")]
    fn derive_separates_hosts(#[case] path: &str) {
        let a = HostId::derive(&FakeProbe::new("alpha", [1, 2, 3, 4, 5, 6])).unwrap();
        let b = HostId::derive(&FakeProbe::new("beta", [1, 2, 3, 4, 5, 6])).unwrap();
        assert_ne!(Poid::derive(&a, path), Poid::derive(&b, path));
    }

    #[rstest]
    #[case("/a/b", "/a/c")]
    #[case("/a/b", "/a/b/")]
    #[case("/a/b", "/A/b")]
    fn derive_separates_paths(#[case] first: &str, #[case] second: &str) {
        let h = host("host-a");
        assert_ne!(Poid::derive(&h, first), Poid::derive(&h, second));
    }

    #[test]
    fn resolve_makes_relative_paths_absolute() {
        let h = host("host-a");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(Poid::resolve(&h, "some/file").unwrap(), Poid::derive(&h, cwd.join("some/file")));
        assert_eq!(Poid::resolve(&h, "/etc/hosts").unwrap(), Poid::derive(&h, "/etc/hosts"));
    }

    #[cfg(unix)]
    #[rstest]
    #[case("/srv/data/file", "/srv/data/file")]
    #[case("/srv/other/../data/file", "/srv/data/file")]
    #[case("/srv/data/file/", "/srv/data/file")]
    #[case("/srv/./data//file", "/srv/data/file")]
    #[case("/srv/data/./file/.", "/srv/data/file")]
    #[case("/srv/data/file/..", "/srv/data")]
    #[case("/../srv/data", "/srv/data")]
    #[case("/", "/")]
    fn resolve_cleans_path_spellings(#[case] spelling: &str, #[case] canonical: &str) {
        let h = host("host-a");
        assert_eq!(absolute_path(spelling).unwrap(), PathBuf::from(canonical));
        assert_eq!(Poid::resolve(&h, spelling).unwrap(), Poid::derive(&h, canonical));
    }

    #[test]
    fn resolve_cleans_relative_parent_components() {
        let h = host("host-a");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(Poid::resolve(&h, "a/../b/").unwrap(), Poid::derive(&h, cwd.join("b")));
    }

    #[test]
    fn resolve_rejects_empty_path() {
        let err = Poid::resolve(&host("host-a"), "").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn text_forms_round_trip() {
        let poid = Poid::derive(&host("host-a"), "/a/b");
        assert_eq!(poid.to_string().parse::<Poid>().unwrap(), poid);
        let json = serde_json::to_string(&poid).unwrap();
        assert_eq!(json, format!("\"{}\"", poid.to_hex()));
        assert_eq!(serde_json::from_str::<Poid>(&json).unwrap(), poid);
    }

    #[test]
    fn bytes_round_trip() {
        let poid = Poid::derive(&host("host-a"), "/a/b");
        assert_eq!(Poid::from_bytes(*poid.as_bytes()), poid);
    }
}
