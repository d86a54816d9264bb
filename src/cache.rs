use chrono::{DateTime, Duration, Utc};

/// A value with a deadline, the unit the in-memory stores keep per key.
#[derive(Debug, Clone)]
pub struct Expiring<T> {
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// The value, unless its deadline has passed.
    pub fn live(&self) -> Option<&T> {
        if self.is_expired() {
            None
        } else {
            Some(&self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_until_deadline() {
        let fresh = Expiring::new("jti", Duration::minutes(1));
        assert_eq!(fresh.live(), Some(&"jti"));

        let stale = Expiring::new("jti", Duration::zero());
        assert!(stale.is_expired());
        assert!(stale.live().is_none());
    }
}
