//! Network-related rules. Addresses are only parsed; no name resolution is performed.

use std::{
    fs,
    net::{IpAddr, SocketAddr},
};

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::format::HOSTNAME_RFC1123;
use crate::{error::SchemaErrorKind, field::Field};

static URN_RFC2141: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:urn):([a-zA-Z0-9][a-zA-Z0-9-]{0,31}):((?:[a-zA-Z0-9()+,\-.:=@;$_!*'/?#]|%[0-9A-Fa-f]{2})+)$")
        .expect("URN regex should be valid")
});

/// Strips the fragment similarly to browsers.
fn strip_fragment(s: &str) -> &str {
    s.split_once('#').map_or(s, |(head, _)| head)
}

pub(super) fn url(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some(s) = field.str().map(strip_fragment) else {
        return Ok(false);
    };
    Ok(!s.is_empty() && Url::parse(s).is_ok())
}

/// Absolute URI or an absolute path.
pub(super) fn uri(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    static BASE: Lazy<Url> =
        Lazy::new(|| Url::parse("http://localhost/").expect("base URL should be valid"));

    let Some(s) = field.str().map(strip_fragment) else {
        return Ok(false);
    };
    if s.is_empty() {
        return Ok(false);
    }
    Ok(if s.starts_with('/') {
        BASE.join(s).is_ok()
    } else {
        Url::parse(s).is_ok()
    })
}

pub(super) fn urn_rfc2141(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some(s) = field.str() else {
        return Ok(false);
    };
    let Some(captures) = URN_RFC2141.captures(s) else {
        return Ok(false);
    };
    Ok(!captures[1].eq_ignore_ascii_case("urn"))
}

/// Path to an existing file (i.e., anything other than a directory).
pub(super) fn file(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field
        .str()
        .is_some_and(|path| fs::metadata(path).is_ok_and(|meta| !meta.is_dir())))
}

fn is_v4(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(_) => true,
        IpAddr::V6(ip) => ip.to_ipv4_mapped().is_some(),
    }
}

fn parse_ip(field: &Field<'_>) -> Option<IpAddr> {
    field.str()?.parse().ok()
}

pub(super) fn ip(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_ip(field).is_some())
}

pub(super) fn ipv4(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_ip(field).is_some_and(is_v4))
}

pub(super) fn ipv6(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_ip(field).is_some_and(|ip| !is_v4(ip)))
}

pub(super) fn ip_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    ip(field)
}

pub(super) fn ip4_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    ipv4(field)
}

pub(super) fn ip6_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    ipv6(field)
}

fn parse_socket_addr(field: &Field<'_>) -> Option<SocketAddr> {
    field.str()?.parse().ok()
}

pub(super) fn tcp_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_socket_addr(field).is_some())
}

pub(super) fn tcp4_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_socket_addr(field).is_some_and(|addr| is_v4(addr.ip())))
}

pub(super) fn tcp6_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(parse_socket_addr(field).is_some_and(|addr| !is_v4(addr.ip())))
}

// UDP and TCP addresses have the same format.

pub(super) fn udp_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    tcp_addr(field)
}

pub(super) fn udp4_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    tcp4_addr(field)
}

pub(super) fn udp6_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    tcp6_addr(field)
}

/// Any string is a valid Unix socket path.
pub(super) fn unix_addr(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.str().is_some())
}

pub(super) fn mac(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.str().is_some_and(is_mac))
}

/// Accepts IEEE 802 MAC-48, EUI-48, EUI-64 and 20-byte IP over InfiniBand addresses in the
/// `01:23:45:67:89:ab`, `01-23-45-67-89-ab` and `0123.4567.89ab` forms.
fn is_mac(s: &str) -> bool {
    const SIZES: [usize; 3] = [6, 8, 20];

    let bytes = s.as_bytes();
    if bytes.len() < 14 {
        return false;
    }
    let (group_len, separator) = match bytes[2] {
        b':' | b'-' => (2, bytes[2]),
        _ if bytes[4] == b'.' => (4, b'.'),
        _ => return false,
    };
    if (bytes.len() + 1) % (group_len + 1) != 0 {
        return false;
    }
    let group_count = (bytes.len() + 1) / (group_len + 1);
    if !SIZES.contains(&(group_count * group_len / 2)) {
        return false;
    }

    bytes.chunks(group_len + 1).all(|chunk| {
        let (digits, rest) = chunk.split_at(group_len);
        let separated = match rest {
            [] => true,
            [sep] => *sep == separator,
            _ => false,
        };
        separated && digits.iter().all(u8::is_ascii_hexdigit)
    })
}

/// `host:port` with a DNS host name (possibly empty) and a port in `1..=65535`.
pub(super) fn hostname_port(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some((host, port)) = field.str().and_then(split_host_port) else {
        return Ok(false);
    };
    if !port.parse::<u16>().is_ok_and(|port| port != 0) {
        return Ok(false);
    }
    Ok(host.is_empty() || HOSTNAME_RFC1123.is_match(host))
}

fn split_host_port(s: &str) -> Option<(&str, &str)> {
    let (host, port) = s.rsplit_once(':')?;
    let host = if let Some(bracketed) = host.strip_prefix('[') {
        bracketed.strip_suffix(']')?
    } else if host.contains(':') {
        return None;
    } else {
        host
    };
    Some((host, port))
}
