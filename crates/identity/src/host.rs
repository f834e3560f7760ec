use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pistore_digest::Digest;
use serde::de::{Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::instrument;

/// A 6-byte link-layer (MAC) address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HardwareAddress([u8; 6]);

impl HardwareAddress {
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

/// Lowercase, colon-separated: `02:42:ac:11:00:02`.
impl Display for HardwareAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Observes the host attributes a [`HostId`] is derived from.
///
/// [`SystemProbe`] reads the real machine; anything else (tests, containers
/// with pinned identities) can implement this trait.
pub trait HostProbe {
    /// Hardware address of the first non-loopback network interface.
    fn hardware_address(&self) -> Result<HardwareAddress>;
    fn hostname(&self) -> Result<String>;
}

/// Reads host attributes from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn hardware_address(&self) -> Result<HardwareAddress> {
        // Loopback reports an all-zero address, which `get_mac_address` skips.
        match mac_address::get_mac_address().or_raise(|| ErrorKind::NoInterface)? {
            Some(mac) => Ok(HardwareAddress::new(mac.bytes())),
            None => exn::bail!(ErrorKind::NoInterface),
        }
    }

    fn hostname(&self) -> Result<String> {
        match gethostname::gethostname().into_string() {
            Ok(name) if !name.is_empty() => Ok(name),
            _ => exn::bail!(ErrorKind::Hostname),
        }
    }
}

/// Unique identifier for a backup host, as lowercase hex text.
///
/// Derived values are `hex(digest("<hostname>-<hardware address>"))`; values
/// restored from configuration are opaque tokens and used verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostId(String);

impl HostId {
    /// Wrap a previously derived (or otherwise assigned) host ID.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidHostId(token));
        }
        Ok(Self(token))
    }

    /// Derive the host ID from the attributes reported by `probe`.
    ///
    /// Fails if the probe cannot find a hardware address or hostname; there is
    /// no fallback scheme.
    #[instrument(skip(probe))]
    pub fn derive(probe: &impl HostProbe) -> Result<Self> {
        let hardware = probe.hardware_address()?;
        let hostname = probe.hostname()?;
        let id = Self::from_parts(&hostname, hardware);
        tracing::debug!(%hostname, %hardware, host_id = %id, "Derived host ID");
        Ok(id)
    }

    /// Derive from the system's own attributes.
    pub fn from_system() -> Result<Self> {
        Self::derive(&SystemProbe)
    }

    #[must_use]
    pub fn from_parts(hostname: &str, hardware: HardwareAddress) -> Self {
        Self(Digest::of(format!("{hostname}-{hardware}")).to_hex())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for HostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<HostId> for String {
    fn from(value: HostId) -> Self {
        value.0
    }
}

impl Serialize for HostId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(HostIdVisitor)
    }
}

/// Accepts integers as well as strings: config formats happily read an
/// all-digit token like `12345` as a number.
struct HostIdVisitor;

impl HostIdVisitor {
    fn token<E: serde::de::Error>(token: String) -> std::result::Result<HostId, E> {
        HostId::new(token).map_err(|e| E::custom(&*e))
    }
}

impl Visitor<'_> for HostIdVisitor {
    type Value = HostId;

    fn expecting(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("a host ID string")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<HostId, E> {
        Self::token(v.to_string())
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> std::result::Result<HostId, E> {
        Self::token(v)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<HostId, E> {
        Self::token(v.to_string())
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<HostId, E> {
        Self::token(v.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) struct FakeProbe {
        pub hardware: Option<[u8; 6]>,
        pub hostname: Option<&'static str>,
    }

    impl FakeProbe {
        pub(crate) fn new(hostname: &'static str, hardware: [u8; 6]) -> Self {
            Self { hardware: Some(hardware), hostname: Some(hostname) }
        }
    }

    impl HostProbe for FakeProbe {
        fn hardware_address(&self) -> Result<HardwareAddress> {
            match self.hardware {
                Some(bytes) => Ok(HardwareAddress::new(bytes)),
                None => exn::bail!(ErrorKind::NoInterface),
            }
        }

        fn hostname(&self) -> Result<String> {
            match self.hostname {
                Some(name) => Ok(name.to_string()),
                None => exn::bail!(ErrorKind::Hostname),
            }
        }
    }

    #[test]
    fn hardware_address_display() {
        let addr = HardwareAddress::new([0x02, 0x42, 0xAC, 0x11, 0x00, 0x02]);
        assert_eq!(addr.to_string(), "02:42:ac:11:00:02");
    }

    #[test]
    fn derive_hashes_hostname_and_hardware_address() {
        let probe = FakeProbe::new("backup-01", [0x02, 0x42, 0xAC, 0x11, 0x00, 0x02]);
        let id = HostId::derive(&probe).unwrap();
        assert_eq!(id.as_str(), Digest::of("backup-01-02:42:ac:11:00:02").to_hex());
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn derive_is_stable() {
        let probe = FakeProbe::new("backup-01", [1, 2, 3, 4, 5, 6]);
        assert_eq!(HostId::derive(&probe).unwrap(), HostId::derive(&probe).unwrap());
    }

    #[rstest]
    #[case("backup-02", [1, 2, 3, 4, 5, 6])]
    #[case("backup-01", [1, 2, 3, 4, 5, 7])]
    fn derive_separates_hosts(#[case] hostname: &'static str, #[case] hardware: [u8; 6]) {
        let reference = HostId::derive(&FakeProbe::new("backup-01", [1, 2, 3, 4, 5, 6])).unwrap();
        assert_ne!(HostId::derive(&FakeProbe::new(hostname, hardware)).unwrap(), reference);
    }

    #[test]
    fn derive_without_interface_fails() {
        let probe = FakeProbe { hardware: None, hostname: Some("backup-01") };
        let err = HostId::derive(&probe).unwrap_err();
        assert_eq!(*err, ErrorKind::NoInterface);
    }

    #[test]
    fn derive_without_hostname_fails() {
        let probe = FakeProbe { hardware: Some([1, 2, 3, 4, 5, 6]), hostname: None };
        let err = HostId::derive(&probe).unwrap_err();
        assert_eq!(*err, ErrorKind::Hostname);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn new_rejects_blank_tokens(#[case] token: &str) {
        assert!(matches!(&*HostId::new(token).unwrap_err(), ErrorKind::InvalidHostId(_)));
    }

    #[test]
    fn new_keeps_token_verbatim() {
        assert_eq!(HostId::new("persisted-token").unwrap().as_str(), "persisted-token");
    }

    #[test]
    fn serde_as_plain_string() {
        let id = HostId::new("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        assert_eq!(serde_json::from_str::<HostId>("\"abc123\"").unwrap(), id);
        assert!(serde_json::from_str::<HostId>("\"\"").is_err());
    }

    #[rstest]
    #[case("12345", "12345")]
    #[case("-7", "-7")]
    #[case("\"0042\"", "0042")]
    fn serde_accepts_numeric_tokens(#[case] json: &str, #[case] expected: &str) {
        assert_eq!(serde_json::from_str::<HostId>(json).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("true")]
    #[case("null")]
    #[case("[1]")]
    fn serde_rejects_non_scalar_tokens(#[case] json: &str) {
        assert!(serde_json::from_str::<HostId>(json).is_err());
    }
}
