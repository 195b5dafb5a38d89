use std::time::Duration;

/// Fixed-delay, unbounded retry. The bot runs unattended indefinitely, so
/// there is no attempt cap and the delay never grows.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    pub delay: Duration,
}

impl ReconnectConfig {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            delay: Duration::from_secs(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReconnectConfig;
    use std::time::Duration;

    #[test]
    fn delay_is_fixed() {
        let cfg = ReconnectConfig::from_secs(3);
        assert_eq!(cfg.delay, Duration::from_secs(3));
    }
}
