//! Shareable custom IDs used to invite users to a team

use crate::error::DomainError;

pub const CUSTOM_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CUSTOM_ID_LEN: usize = 8;
const RANDOM_PART_LEN: usize = 6;

/// Build a custom ID from a source of charset indices and a clock reading.
///
/// Six random characters followed by the last two base-36 digits of the
/// timestamp in milliseconds. `next_index` receives the charset length and
/// must return an index below it.
pub fn compose_custom_id(mut next_index: impl FnMut(usize) -> usize, now_millis: u64) -> String {
    let mut id = String::with_capacity(CUSTOM_ID_LEN);

    for _ in 0..RANDOM_PART_LEN {
        let idx = next_index(CUSTOM_ID_CHARSET.len()) % CUSTOM_ID_CHARSET.len();
        id.push(CUSTOM_ID_CHARSET[idx] as char);
    }

    id.push_str(&time_suffix(now_millis));
    id
}

/// Last two base-36 digits of a timestamp, uppercased
fn time_suffix(now_millis: u64) -> String {
    let low = (now_millis % (36 * 36)) as usize;
    let digit = |n: usize| CUSTOM_ID_BASE36[n] as char;
    [digit(low / 36), digit(low % 36)].iter().collect()
}

const CUSTOM_ID_BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a fresh custom ID with the thread RNG and the system clock
#[cfg(feature = "rand")]
pub fn generate_custom_id() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let now_millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    compose_custom_id(|len| rng.gen_range(0..len), now_millis)
}

/// Canonical form of a user-supplied custom ID
pub fn normalize_custom_id(input: &str) -> Result<String, DomainError> {
    let id = input.trim().to_uppercase();

    if id.len() != CUSTOM_ID_LEN || !id.bytes().all(|b| CUSTOM_ID_CHARSET.contains(&b)) {
        return Err(DomainError::InvalidCustomId(input.to_string()));
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_layout() {
        // 1295 = "ZZ" in base 36
        let id = compose_custom_id(|_| 0, 1295);
        assert_eq!(id, "AAAAAAZZ");

        let id = compose_custom_id(|len| len - 1, 36 * 36 + 37);
        assert_eq!(id, "99999911");
    }

    #[test]
    fn test_compose_is_always_valid() {
        let mut n = 0usize;
        for millis in [0u64, 1, 35, 36, 1_700_000_000_000] {
            let id = compose_custom_id(
                |len| {
                    n += 7;
                    n % len
                },
                millis,
            );
            assert_eq!(normalize_custom_id(&id), Ok(id.clone()));
        }
    }

    #[cfg(feature = "rand")]
    #[test]
    fn test_generate_format() {
        let id = generate_custom_id();
        assert_eq!(id.len(), CUSTOM_ID_LEN);
        assert!(normalize_custom_id(&id).is_ok());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_custom_id(" ab12cd34 "), Ok("AB12CD34".to_string()));
        assert!(normalize_custom_id("AB12CD3").is_err());
        assert!(normalize_custom_id("AB12CD3-").is_err());
        assert!(normalize_custom_id("ÁB12CD34").is_err());
    }
}
