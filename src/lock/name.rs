//! OS-visible socket names for channel locks

use std::borrow::Cow;

use crate::constants::{LOCK_CLASS_PREFIX_LENGTH, LOCK_NAME_SUFFIX, MAX_SOCKET_NAME_LENGTH};

/// djb2 string hash (`hash * 33 + byte`, seeded with 5381), wrapping on
/// overflow
pub const fn djb2(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 5381;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash.wrapping_mul(33).wrapping_add(bytes[i] as u64);
        i += 1;
    }
    hash
}

/// Socket name used to bind the lock called `lock_name`.
///
/// Names shorter than [`MAX_SOCKET_NAME_LENGTH`] bytes are used unchanged.
/// Longer ones keep their first [`LOCK_CLASS_PREFIX_LENGTH`] characters,
/// followed by the decimal djb2 hash of the full name and
/// [`LOCK_NAME_SUFFIX`]. The result is stable across runs.
pub fn socket_name(lock_name: &str) -> Cow<'_, str> {
    if lock_name.len() < MAX_SOCKET_NAME_LENGTH {
        return Cow::Borrowed(lock_name);
    }
    let prefix: String = lock_name.chars().take(LOCK_CLASS_PREFIX_LENGTH).collect();
    let hash = djb2(lock_name.as_bytes());
    Cow::Owned(format!("{prefix}{hash}{LOCK_NAME_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_name(tail: &str) -> String {
        format!("ReadoutCard_DMA_{}{tail}", "x".repeat(MAX_SOCKET_NAME_LENGTH))
    }

    #[test]
    fn djb2_reference_values() {
        assert_eq!(djb2(b""), 5381);
        assert_eq!(djb2(b"a"), 5381 * 33 + 97);
        assert_eq!(djb2(b"ab"), (5381 * 33 + 97) * 33 + 98);
    }

    #[test]
    fn short_names_pass_through() {
        let name = "ReadoutCard_DMA_0000:3b:00.0_chan0_lock";
        assert!(matches!(socket_name(name), Cow::Borrowed(n) if n == name));
    }

    #[test]
    fn boundary_length_is_hashed() {
        let just_under = "a".repeat(MAX_SOCKET_NAME_LENGTH - 1);
        let at_limit = "a".repeat(MAX_SOCKET_NAME_LENGTH);
        assert_eq!(socket_name(&just_under), just_under.as_str());
        assert_ne!(socket_name(&at_limit), at_limit.as_str());
    }

    #[test]
    fn long_names_are_shortened_deterministically() {
        let name = long_name("_chan0_lock");
        let first = socket_name(&name);
        let second = socket_name(&name);
        assert_eq!(first, second);
        assert!(first.len() < MAX_SOCKET_NAME_LENGTH);
        assert!(first.starts_with("ReadoutCard_DMA_x"));
        assert!(first.ends_with(LOCK_NAME_SUFFIX));
        assert_eq!(
            first,
            format!("ReadoutCard_DMA_x{}_lock", djb2(name.as_bytes()))
        );
    }

    #[test]
    fn long_names_with_shared_prefix_do_not_collide() {
        let a = long_name("_chan0_lock");
        let b = long_name("_chan1_lock");
        assert_ne!(socket_name(&a), socket_name(&b));
    }

    #[test]
    fn prefix_respects_char_boundaries() {
        let name = "é".repeat(MAX_SOCKET_NAME_LENGTH);
        let short = socket_name(&name);
        assert!(short.starts_with(&"é".repeat(LOCK_CLASS_PREFIX_LENGTH)));
    }
}
