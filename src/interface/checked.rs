/// Registers verified by [`super::Device::check_next_register`]
pub const MAX_CHECKED_REGISTERS: usize = 6;

/// Table of registers whose values are periodically read back
///
/// Checked writes record the value, the sampling task verifies one entry
/// every `frequency` calls.
#[derive(Debug, Clone)]
pub struct CheckedRegisters {
    regs: [(u8, u8); MAX_CHECKED_REGISTERS],
    len: usize,
    next: usize,
    frequency: u8,
    counter: u8,
}

impl Default for CheckedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckedRegisters {
    pub const fn new() -> Self {
        Self {
            regs: [(0, 0); MAX_CHECKED_REGISTERS],
            len: 0,
            next: 0,
            frequency: 1,
            counter: 0,
        }
    }

    /// Drop all entries and verify one register every `frequency` calls
    pub fn setup(&mut self, frequency: u8) {
        *self = Self::new();
        self.frequency = frequency.max(1);
    }

    /// Record the expected value of `reg`
    ///
    /// Entries beyond the table capacity are ignored.
    pub fn set(&mut self, reg: u8, value: u8) {
        if let Some(entry) = self.regs[..self.len].iter_mut().find(|(r, _)| *r == reg) {
            entry.1 = value;
        } else if self.len < MAX_CHECKED_REGISTERS {
            self.regs[self.len] = (reg, value);
            self.len += 1;
        }
    }

    pub fn expected(&self, reg: u8) -> Option<u8> {
        self.regs[..self.len]
            .iter()
            .find(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Next `(register, expected)` pair to verify, if one is due
    pub(crate) fn next_due(&mut self) -> Option<(u8, u8)> {
        if self.len == 0 {
            return None;
        }
        self.counter += 1;
        if self.counter < self.frequency {
            return None;
        }
        self.counter = 0;
        let entry = self.regs[self.next];
        self.next = (self.next + 1) % self.len;
        Some(entry)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_updates_in_place() {
        let mut checked = CheckedRegisters::new();
        checked.set(0x1A, 0x41);
        checked.set(0x1A, 0x40);
        assert_eq!(checked.len(), 1);
        assert_eq!(checked.expected(0x1A), Some(0x40));
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut checked = CheckedRegisters::new();
        for reg in 0..10u8 {
            checked.set(reg, reg);
        }
        assert_eq!(checked.len(), MAX_CHECKED_REGISTERS);
        assert_eq!(checked.expected(9), None);
    }

    #[test]
    fn test_rate_limited_round_robin() {
        let mut checked = CheckedRegisters::new();
        checked.setup(3);
        checked.set(0x19, 0);
        checked.set(0x1B, 0x18);

        assert_eq!(checked.next_due(), None);
        assert_eq!(checked.next_due(), None);
        assert_eq!(checked.next_due(), Some((0x19, 0)));
        assert_eq!(checked.next_due(), None);
        assert_eq!(checked.next_due(), None);
        assert_eq!(checked.next_due(), Some((0x1B, 0x18)));
        checked.next_due();
        checked.next_due();
        assert_eq!(checked.next_due(), Some((0x19, 0)));
    }

    #[test]
    fn test_empty_table_never_due() {
        let mut checked = CheckedRegisters::new();
        for _ in 0..50 {
            assert_eq!(checked.next_due(), None);
        }
    }
}
