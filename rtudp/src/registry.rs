use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::inbox::Inbox;

/// Process-global mapping from `(ip, port)` to the [`Inbox`] backing that
/// address, used by the emulated transport to find a peer's receive queue
/// without any real socket.
///
/// Mirrors the original implementation's class-level `GlobalQueueRegistry`:
/// first caller for an address fixes its capacity, the entry is never
/// removed, and lookups are `O(1)` under one global lock.
static REGISTRY: Lazy<Mutex<HashMap<(IpAddr, u16), Arc<Inbox>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the inbox for `(ip, port)`, creating it with `capacity` if this is
/// the first time the address has been seen. A later call for the same
/// address with a different `capacity` is a no-op for capacity — the
/// existing inbox is returned unchanged.
pub fn get_or_create(ip: IpAddr, port: u16, capacity: usize) -> Arc<Inbox> {
    let mut registry = REGISTRY.lock();
    registry
        .entry((ip, port))
        .or_insert_with(|| Arc::new(Inbox::new(capacity)))
        .clone()
}

#[cfg(test)]
pub(crate) fn len() -> usize {
    REGISTRY.lock().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last_octet: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, last_octet))
    }

    #[test]
    fn repeated_lookup_returns_the_same_inbox() {
        let a = get_or_create(addr(200), 9100, 16);
        let b = get_or_create(addr(200), 9100, 999);

        assert!(Arc::ptr_eq(&a, &b), "capacity on second call must not replace the inbox");
    }

    #[test]
    fn distinct_addresses_get_distinct_inboxes() {
        let a = get_or_create(addr(201), 9101, 16);
        let b = get_or_create(addr(202), 9102, 16);

        assert!(!Arc::ptr_eq(&a, &b));
    }
}
