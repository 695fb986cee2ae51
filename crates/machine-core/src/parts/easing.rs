/// Seconds a lid or spring takes to open fully.
pub const OPENING_TIME: f64 = 0.25;

/// Latched "open" request eased from a closed value toward an open value.
///
/// The rate is `open / OPENING_TIME` per second, so a span that starts above
/// zero finishes early. The value never passes `open`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenProgress {
    requested: bool,
    closed: f64,
    open: f64,
    value: f64,
}

impl OpenProgress {
    pub fn new(closed: f64, open: f64) -> Self {
        Self {
            requested: false,
            closed,
            open,
            value: closed,
        }
    }

    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.open
    }

    pub fn advance(&mut self, delta: f64) {
        if self.requested && self.value < self.open {
            self.value += self.open * delta / OPENING_TIME;
            if self.value > self.open {
                self.value = self.open;
            }
        }
    }

    pub fn reset(&mut self) {
        self.requested = false;
        self.value = self.closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_until_requested() {
        let mut p = OpenProgress::new(0.0, 1.0);
        p.advance(1.0);
        assert_eq!(p.value(), 0.0);
    }

    #[test]
    fn clamps_at_open_value() {
        let mut p = OpenProgress::new(0.0, 2.0);
        p.request();
        p.advance(0.1);
        assert!((p.value() - 0.8).abs() < 1e-12);
        p.advance(1.0);
        assert_eq!(p.value(), 2.0);
    }

    #[test]
    fn reset_clears_request_and_value() {
        let mut p = OpenProgress::new(3.0, 18.0);
        p.request();
        p.advance(0.05);
        p.reset();
        assert!(!p.is_requested());
        assert_eq!(p.value(), 3.0);
    }
}
