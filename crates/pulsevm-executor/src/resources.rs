use std::collections::HashMap;

use parking_lot::Mutex;
use pulsevm_types::Name;

/// The three resource dimensions a transaction's actions bill against an
/// account. Enforcement against a per-account limit is future work (see
/// `ResourceTracker` in the distilled spec): today the tracker only
/// accumulates the deltas a native handler or the tx-level billing step
/// records, for a caller (or a future quota system) to inspect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Net,
    Ram,
    Cpu,
}

/// Accumulates net/ram/cpu deltas per account over the lifetime of one
/// transaction's execution. Deltas may be negative (e.g. `setcode` shrinking
/// an account's installed code refunds the difference).
#[derive(Default)]
pub struct ResourceTracker {
    net: Mutex<HashMap<Name, i64>>,
    ram: Mutex<HashMap<Name, i64>>,
    cpu: Mutex<HashMap<Name, i64>>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: ResourceKind) -> &Mutex<HashMap<Name, i64>> {
        match kind {
            ResourceKind::Net => &self.net,
            ResourceKind::Ram => &self.ram,
            ResourceKind::Cpu => &self.cpu,
        }
    }

    pub fn add(&self, kind: ResourceKind, account: Name, delta: i64) {
        *self.table(kind).lock().entry(account).or_insert(0) += delta;
    }

    pub fn add_net(&self, account: Name, delta: i64) {
        self.add(ResourceKind::Net, account, delta);
    }

    pub fn add_ram(&self, account: Name, delta: i64) {
        self.add(ResourceKind::Ram, account, delta);
    }

    pub fn add_cpu(&self, account: Name, delta: i64) {
        self.add(ResourceKind::Cpu, account, delta);
    }

    pub fn usage(&self, kind: ResourceKind, account: Name) -> i64 {
        self.table(kind).lock().get(&account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_accumulate_per_account() {
        let tracker = ResourceTracker::new();
        let a = Name::from_str_lossy("glenn");
        tracker.add_ram(a, 100);
        tracker.add_ram(a, -30);
        assert_eq!(tracker.usage(ResourceKind::Ram, a), 70);
        assert_eq!(tracker.usage(ResourceKind::Net, a), 0);
    }
}
