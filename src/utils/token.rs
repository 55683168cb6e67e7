use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Human-readable contract reference, e.g. `CTR-20261018-4F1C9A0B2D7E4C1A9B3F6E2D8C5A7B10`.
/// Uniqueness comes from the UUID part, not from the clock.
pub fn generate_contract_number(now: DateTime<Utc>) -> String {
    format!(
        "CTR-{}-{}",
        now.format("%Y%m%d"),
        Uuid::new_v4().simple().to_string().to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_numbers_do_not_collide_within_the_same_instant() {
        let now = Utc::now();
        let first = generate_contract_number(now);
        let second = generate_contract_number(now);
        assert_ne!(first, second);
        assert!(first.starts_with(&format!("CTR-{}-", now.format("%Y%m%d"))));
        assert_eq!(first.len(), "CTR-YYYYMMDD-".len() + 32);
    }
}
