//! Memory

use log::trace;

use crate::*;

/// Memory with one write port and one registered read port.
///
/// - The write port is the ingress: a valid `(address, entry)` pair is stored at the clock edge.
/// - The read port is the egress. Its forward signal is the read data register; its backward
///   signal is the read request. A valid request loads the addressed entry into the register at
///   the clock edge, so data appears one cycle after the request. Without a request the register
///   holds its value.
///
/// # NOTE
///
/// The read port is not transparent: when a read and a write hit the same address on the same
/// cycle, the read returns the entry from before the write.
#[derive(Debug, Clone)]
pub struct Memory<V: Signal> {
    entries: Vec<V>,
    read_data: V,
}

impl<V: Signal + Default> Memory<V> {
    /// Creates a memory of `num_entries` default entries.
    pub fn new(num_entries: usize) -> Self {
        // Memory size should be power of two
        assert!(num_entries.is_power_of_two());
        Self { entries: vec![V::default(); num_entries], read_data: V::default() }
    }
}

impl<V: Signal> Memory<V> {
    /// Number of entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns true if the memory has no entries.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Returns the entry at `addr`, bypassing the read port.
    pub fn peek(&self, addr: usize) -> &V { &self.entries[addr % self.entries.len()] }

    /// Returns the read data register.
    pub fn read_data(&self) -> &V { &self.read_data }
}

impl<V: Signal> Module for Memory<V> {
    type EgressBwd = Valid<usize>;
    type EgressFwd = V;
    type IngressBwd = ();
    type IngressFwd = Valid<(usize, V)>;

    fn fwd(&self, _: &Valid<(usize, V)>) -> V { self.read_data.clone() }

    fn bwd(&self, _: &Valid<(usize, V)>, _: &Valid<usize>) {}

    fn clock(&mut self, i_fwd: &Valid<(usize, V)>, o_bwd: &Valid<usize>) {
        // Addresses wrap modulo the memory size.
        let len = self.entries.len();

        if let Some(addr) = o_bwd.as_option() {
            self.read_data = self.entries[addr % len].clone();
        }

        if let Some((addr, entry)) = i_fwd.as_option() {
            trace!("memory write: [{}] <- {:?}", addr % len, entry);
            self.entries[addr % len] = entry.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_has_one_cycle_latency_and_holds() {
        let mut memory = Memory::<u32>::new(4);
        memory.clock(&Valid::valid((2, 20)), &Valid::invalid());
        memory.clock(&Valid::invalid(), &Valid::valid(2));
        assert_eq!(memory.fwd(&Valid::invalid()), 20);

        // No request: the register holds.
        memory.clock(&Valid::valid((2, 21)), &Valid::invalid());
        assert_eq!(*memory.read_data(), 20);
        assert_eq!(*memory.peek(2), 21);
    }

    #[test]
    fn read_is_not_transparent() {
        let mut memory = Memory::<u32>::new(8);
        memory.clock(&Valid::valid((5, 1)), &Valid::invalid());

        // Write and read the same address on the same cycle.
        memory.clock(&Valid::valid((5, 2)), &Valid::valid(5));
        assert_eq!(*memory.read_data(), 1);

        // One cycle later the read sees the new entry.
        memory.clock(&Valid::invalid(), &Valid::valid(5));
        assert_eq!(*memory.read_data(), 2);
    }

    #[test]
    fn addresses_wrap() {
        let mut memory = Memory::<u8>::new(4);
        memory.clock(&Valid::valid((6, 9)), &Valid::invalid());
        assert_eq!(*memory.peek(2), 9);
        assert_eq!(memory.len(), 4);
    }
}
